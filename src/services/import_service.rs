//! services/import_service.rs
//! Lista de destinatarios desde una planilla (xlsx/xls/ods) o un CSV.
//! La primera fila son los encabezados.

use std::{io::Cursor, path::Path};

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::{ReaderBuilder, Trim};
use rust_xlsxwriter::Workbook;

use crate::{models::recipient_model::Recipient, services::campaign_service::CampaignError};

/// Columnas de la plantilla descargable.
pub const TEMPLATE_HEADERS: [&str; 4] = ["Correo", "Nombre", "Cargo", "Facultad"];

const TEMPLATE_ROWS: [[&str; 4]; 3] = [
    ["ejemplo1@gmail.com", "Juan Pérez", "Estudiante", "Ingeniería"],
    ["ejemplo2@hotmail.com", "María López", "Docente", "Ciencias"],
    ["ejemplo3@upt.edu.pe", "Pedro García", "Egresado", "Arquitectura"],
];

const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];
// zip (xlsx/ods) y OLE (xls)
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

pub fn import_file(path: &Path) -> Result<Vec<Recipient>, CampaignError> {
    let data = std::fs::read(path)?;
    let filename = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    parse_recipients(&filename, &data)
}

/// Elige el lector por extensión; sin extensión conocida, por los primeros bytes.
pub fn parse_recipients(filename: &str, data: &[u8]) -> Result<Vec<Recipient>, CampaignError> {
    if is_workbook(filename, data) {
        parse_workbook(data)
    } else {
        parse_csv(data)
    }
}

fn is_workbook(filename: &str, data: &[u8]) -> bool {
    let extension = Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase());
    match extension.as_deref() {
        Some("csv") | Some("txt") => false,
        Some(ext) if WORKBOOK_EXTENSIONS.contains(&ext) => true,
        _ => data.starts_with(ZIP_MAGIC) || data.starts_with(OLE_MAGIC),
    }
}

/// Primera hoja del libro. Las celdas vacías quedan como texto vacío y los
/// números enteros sin decimales.
pub fn parse_workbook(data: &[u8]) -> Result<Vec<Recipient>, CampaignError> {
    let import_error = |e: calamine::Error| CampaignError::Import(e.to_string());

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data.to_vec())).map_err(import_error)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| CampaignError::Import("El libro no tiene hojas".to_string()))?
        .map_err(import_error)?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(cell_text).collect(),
        None => return Ok(vec![]),
    };

    let mut recipients = Vec::new();
    for row in rows {
        let values: Vec<String> = row.iter().map(cell_text).collect();
        if values.iter().all(String::is_empty) {
            continue;
        }
        let pairs = headers
            .iter()
            .zip(values)
            .filter(|(h, _)| !h.is_empty());
        recipients.push(Recipient::from_pairs(pairs));
    }

    Ok(recipients)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

/// Acepta `,` o `;` como separador (Excel en español exporta con `;`).
pub fn parse_csv(data: &[u8]) -> Result<Vec<Recipient>, CampaignError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(detect_delimiter(data))
        .trim(Trim::All)
        .flexible(true)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| CampaignError::Import(e.to_string()))?
        .clone();

    let mut recipients = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record =
            record.map_err(|e| CampaignError::Import(format!("fila {}: {}", line + 2, e)))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let pairs = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.is_empty())
            .map(|(i, h)| (h, record.get(i).unwrap_or_default()));
        recipients.push(Recipient::from_pairs(pairs));
    }

    Ok(recipients)
}

fn detect_delimiter(data: &[u8]) -> u8 {
    let first_line = data.split(|b| *b == b'\n').next().unwrap_or_default();
    let count = |c: u8| first_line.iter().filter(|b| **b == c).count();
    if count(b';') > count(b',') {
        b';'
    } else {
        b','
    }
}

/// Plantilla descargable: hoja "Destinatarios" con encabezados y tres filas de ejemplo.
pub fn template_xlsx() -> anyhow::Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Destinatarios")?;

    for (col, header) in TEMPLATE_HEADERS.iter().enumerate() {
        sheet.write_string(0, col as u16, *header)?;
    }
    for (row, values) in TEMPLATE_ROWS.iter().enumerate() {
        for (col, value) in values.iter().enumerate() {
            sheet.write_string(row as u32 + 1, col as u16, *value)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_rows() {
        let csv = b" Correo ,Nombre,Cargo\na@gmail.com,Ana,Docente\nb@upt.edu.pe, Luis ,\n";
        let recipients = parse_csv(csv).unwrap();

        assert_eq!(recipients.len(), 2);
        assert_eq!(recipients[0].email(), Some("a@gmail.com"));
        assert_eq!(recipients[1].get("Nombre"), Some("Luis"));
        assert_eq!(recipients[1].get("Cargo"), Some(""));
    }

    #[test]
    fn parses_semicolon_separated_rows_and_skips_blank_lines() {
        let csv = "Correo;Nombre\nana@x.com;Ana, la primera\n;\n".as_bytes();
        let recipients = parse_csv(csv).unwrap();

        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].display_name(), "Ana, la primera");
    }

    #[test]
    fn header_only_file_has_no_recipients() {
        assert!(parse_csv(b"Correo,Nombre\n").unwrap().is_empty());
    }

    #[test]
    fn template_is_a_workbook_the_importer_reads() {
        let bytes = template_xlsx().unwrap();
        assert!(bytes.starts_with(ZIP_MAGIC));

        let recipients = parse_recipients("plantilla_destinatarios.xlsx", &bytes).unwrap();
        assert_eq!(recipients.len(), 3);
        assert_eq!(recipients[2].email(), Some("ejemplo3@upt.edu.pe"));
        assert_eq!(recipients[0].display_name(), "Juan Pérez");
        let columns: Vec<_> = recipients[1].fields().map(|(k, _)| k).collect();
        assert_eq!(columns, TEMPLATE_HEADERS);
    }

    #[test]
    fn workbook_is_detected_without_extension() {
        let bytes = template_xlsx().unwrap();
        assert_eq!(parse_recipients("lista", &bytes).unwrap().len(), 3);
    }

    #[test]
    fn csv_extension_wins_over_content() {
        let recipients = parse_recipients("lista.CSV", b"Correo\na@gmail.com\n").unwrap();
        assert_eq!(recipients[0].email(), Some("a@gmail.com"));
    }

    #[test]
    fn corrupt_workbook_is_an_import_error() {
        assert!(matches!(
            parse_recipients("lista.xlsx", b"no es un libro"),
            Err(CampaignError::Import(_))
        ));
    }
}
