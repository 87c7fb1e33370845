//! services/composer_service.rs
//! Reemplazo de `{{campo}}` y armado del HTML final con la plantilla fija.

use crate::models::{
    attachment_model::{FLYER_CID, LOGO_CID},
    campaign_model::CampaignConfig,
    recipient_model::Recipient,
};

/// Reemplaza cada `{{campo}}` con valor no vacío. Los marcadores sin dato quedan tal cual.
pub fn render_body(template: &str, recipient: &Recipient) -> String {
    let mut body = template.to_string();
    for (field, value) in recipient.fields() {
        if value.is_empty() {
            continue;
        }
        let token = format!("{{{{{}}}}}", field);
        if body.contains(&token) {
            body = body.replace(&token, value);
        }
    }
    body
}

/// Documento HTML autocontenido (CSS en línea). Las imágenes van por `cid:`;
/// si el asset no existe el cliente simplemente no la muestra.
pub fn compose_html(config: &CampaignConfig, recipient: &Recipient) -> String {
    let body = render_body(&config.body_html, recipient);
    wrap_layout(&body, config.footer())
}

pub fn wrap_layout(body: &str, footer: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
</head>
<body style="font-family: Arial, sans-serif; margin: 0; padding: 0; background-color: #f6f7fb;">
    <div style="max-width: 600px; margin: 30px auto; background-color: #ffffff; border-radius: 12px; overflow: hidden; box-shadow: 0 4px 10px rgba(0,0,0,0.08);">
        <div style="background-color: rgb(45,54,111); text-align: center; padding: 20px;">
            <img src="cid:{logo}" alt="Logo" style="max-height: 70px;">
        </div>
        <div style="padding: 30px; line-height: 1.6; font-size: 15px; color: #333;">
            {body}
        </div>
        <div style="text-align: center; padding: 0 30px 10px 30px;">
            <img src="cid:{flyer}" alt="Flyer" style="width: 100%; max-width: 540px; border-radius: 10px;">
        </div>
        <div style="padding: 20px 30px; line-height: 1.4; font-size: 13px; color: #666; border-top: 1px solid #eee;">
            {footer}
        </div>
    </div>
</body>
</html>"#,
        logo = LOGO_CID,
        flyer = FLYER_CID,
        body = body,
        footer = footer,
    )
}
