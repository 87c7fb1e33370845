//! services/upload_service.rs
//! Guarda en disco los archivos subidos (lista, imágenes, carpetas de adjuntos).

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};

use crate::{
    config::app_config::AppConfig,
    models::attachment_model::{AssetKind, FolderKind, UploadedFile},
    services::attachment_service::sort_by_numeric_key,
};

#[derive(Clone, Debug)]
pub struct UploadService {
    uploads_dir: Arc<PathBuf>,
    assets_dir: Arc<PathBuf>,
}

impl UploadService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            uploads_dir: Arc::new(config.uploads_dir()),
            assets_dir: Arc::new(config.assets_dir()),
        }
    }

    /// Crea uploads/ y assets/ si no existen.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [self.uploads_dir.as_path(), self.assets_dir.as_path()] {
            fs::create_dir_all(dir).with_context(|| format!("No se pudo crear {:?}", dir))?;
        }
        Ok(())
    }

    pub fn save_recipient_list(&self, file: &UploadedFile) -> Result<PathBuf> {
        save_into(&self.uploads_dir, file)
    }

    pub fn save_asset(&self, kind: AssetKind, file: &UploadedFile) -> Result<PathBuf> {
        let path = save_into(&self.assets_dir, file)?;
        log::info!("Asset {:?} guardado en {:?}", kind, path);
        Ok(path)
    }

    /// Ordena por la clave numérica del nombre y guarda en assets/<carpeta>/.
    /// Devuelve las rutas en ese orden.
    pub fn save_folder(&self, folder: FolderKind, mut files: Vec<UploadedFile>) -> Result<Vec<PathBuf>> {
        sort_by_numeric_key(&mut files, |f| sanitize_filename(&f.filename));

        let target_dir = self.assets_dir.join(folder.dir_name());
        log::info!("Uploading {} files to {}", files.len(), folder.dir_name());

        let mut saved = Vec::with_capacity(files.len());
        for file in &files {
            let path = save_into(&target_dir, file)?;
            log::info!("Saving file: {} -> {:?}", file.filename, path);
            saved.push(path);
        }

        log::info!("Successfully uploaded {} files to {}", saved.len(), folder.dir_name());
        Ok(saved)
    }
}

/// El navegador puede mandar la ruta completa; nos quedamos con el nombre.
pub fn sanitize_filename(raw: &str) -> &str {
    raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim()
}

fn save_into(dir: &Path, file: &UploadedFile) -> Result<PathBuf> {
    let name = sanitize_filename(&file.filename);
    if name.is_empty() || name == "." || name == ".." {
        return Err(anyhow!("Nombre de archivo inválido: '{}'", file.filename));
    }

    fs::create_dir_all(dir).with_context(|| format!("No se pudo crear {:?}", dir))?;
    let path = dir.join(name);
    fs::write(&path, &file.data).with_context(|| format!("Error escribiendo {:?}", path))?;
    Ok(path)
}
