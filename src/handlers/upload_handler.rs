//! handlers/upload_handler.rs
//! Subida de la lista de destinatarios, imágenes y carpetas de adjuntos.
//! Todo llega como `multipart/form-data`.

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use anyhow::{anyhow, Result};
use futures_util::TryStreamExt;
use serde_json::json;

use crate::{
    models::attachment_model::{AssetKind, FolderKind, UploadForm, UploadedFile},
    services::{campaign_service::CampaignService, import_service, upload_service::UploadService},
};

const PREVIEW_ROWS: usize = 5;
/// Tope del formulario completo (archivos + campos).
const MAX_FORM_BYTES: usize = 50 * 1024 * 1024;

fn bad_request(error: impl ToString) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({
        "success": false,
        "error": error.to_string()
    }))
}

fn internal_error(error: anyhow::Error) -> HttpResponse {
    log::error!("{:?}", error);
    HttpResponse::InternalServerError().json(json!({
        "success": false,
        "error": error.to_string()
    }))
}

/// Lee el formulario completo. Las partes con `filename` son archivos; el
/// resto, campos de texto.
async fn read_form(mut payload: Multipart) -> Result<UploadForm> {
    let mut form = UploadForm::default();
    let mut total = 0usize;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| anyhow!("Formulario inválido: {}", e))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        let mut data = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| anyhow!("Error leyendo '{}': {}", name, e))?
        {
            total += chunk.len();
            if total > MAX_FORM_BYTES {
                return Err(anyhow!("El formulario supera {} bytes", MAX_FORM_BYTES));
            }
            data.extend_from_slice(&chunk);
        }

        match filename {
            Some(filename) => form.files.push(UploadedFile { filename, data }),
            None => {
                form.fields
                    .insert(name, String::from_utf8_lossy(&data).into_owned());
            }
        }
    }

    Ok(form)
}

/// POST /api/upload/excel (`file`)
pub async fn upload_recipients_endpoint(
    upload_service: web::Data<UploadService>,
    campaign_service: web::Data<CampaignService>,
    payload: Multipart,
) -> HttpResponse {
    let mut form = match read_form(payload).await {
        Ok(form) => form,
        Err(e) => return bad_request(e),
    };
    let Some(file) = form.take_file() else {
        return bad_request("Falta el archivo 'file'");
    };

    let path = match upload_service.save_recipient_list(&file) {
        Ok(path) => path,
        Err(e) => return internal_error(e),
    };

    match import_service::import_file(&path) {
        Ok(recipients) => {
            log::info!("{} destinatarios importados desde {:?}", recipients.len(), path);
            let store = campaign_service.store();
            store.set_recipients(recipients);
            HttpResponse::Ok().json(json!({
                "count": store.recipient_count(),
                "preview": store.recipients_preview(PREVIEW_ROWS)
            }))
        }
        Err(e) => bad_request(e),
    }
}

/// POST /api/upload/asset (`file`, `type` = logo | flyer)
pub async fn upload_asset_endpoint(
    upload_service: web::Data<UploadService>,
    campaign_service: web::Data<CampaignService>,
    payload: Multipart,
) -> HttpResponse {
    let mut form = match read_form(payload).await {
        Ok(form) => form,
        Err(e) => return bad_request(e),
    };
    let kind: AssetKind = match form.field("type").unwrap_or_default().parse() {
        Ok(kind) => kind,
        Err(e) => return bad_request(e),
    };
    let Some(file) = form.take_file() else {
        return bad_request("Falta el archivo 'file'");
    };

    match upload_service.save_asset(kind, &file) {
        Ok(path) => {
            campaign_service.store().set_asset(kind, path.clone());
            HttpResponse::Ok().json(json!({
                "status": "uploaded",
                "path": path.to_string_lossy()
            }))
        }
        Err(e) => internal_error(e),
    }
}

/// POST /api/upload/assets-folder (`files` repetido, `folder_type` = folder1 | folder2)
pub async fn upload_folder_endpoint(
    upload_service: web::Data<UploadService>,
    campaign_service: web::Data<CampaignService>,
    payload: Multipart,
) -> HttpResponse {
    let form = match read_form(payload).await {
        Ok(form) => form,
        Err(e) => return bad_request(e),
    };
    let folder: FolderKind = match form.field("folder_type").unwrap_or_default().parse() {
        Ok(folder) => folder,
        Err(e) => return bad_request(e),
    };

    match upload_service.save_folder(folder, form.files) {
        Ok(paths) => {
            let count = paths.len();
            campaign_service.store().set_folder(folder, paths);
            HttpResponse::Ok().json(json!({
                "status": "uploaded",
                "count": count
            }))
        }
        Err(e) => internal_error(e),
    }
}
