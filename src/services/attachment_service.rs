//! services/attachment_service.rs
//! Orden numérico de las carpetas subidas y emparejamiento fila i -> archivo i.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::attachment_model::AttachmentSequence;

static FIRST_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("regex válido"));

/// Primer grupo de dígitos del nombre. `None` (sin dígitos) ordena al final.
pub fn numeric_key(filename: &str) -> Option<u64> {
    FIRST_DIGITS
        .find(filename)
        // un número demasiado largo sigue siendo "con dígitos"
        .map(|m| m.as_str().parse().unwrap_or(u64::MAX))
}

/// Orden estable: empates conservan el orden de envío.
pub fn sort_by_numeric_key<T, F>(items: &mut [T], name_of: F)
where
    F: Fn(&T) -> &str,
{
    items.sort_by_key(|item| match numeric_key(name_of(item)) {
        Some(n) => (false, n),
        None => (true, 0),
    });
}

/// Nombre base tal como aparece en el reporte.
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Adjuntos elegidos para una fila. Cada carpeta aporta a lo sumo uno.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairedAttachments {
    pub first: Option<PathBuf>,
    pub second: Option<PathBuf>,
}

impl PairedAttachments {
    pub fn paths(&self) -> Vec<PathBuf> {
        self.first.iter().chain(self.second.iter()).cloned().collect()
    }

    pub fn first_name(&self) -> String {
        self.first.as_deref().map(base_name).unwrap_or_default()
    }

    pub fn second_name(&self) -> String {
        self.second.as_deref().map(base_name).unwrap_or_default()
    }
}

/// Unión puramente posicional: no depende del contenido de la fila ni valida
/// que las cantidades coincidan.
pub fn pair(index: usize, folder1: &AttachmentSequence, folder2: &AttachmentSequence) -> PairedAttachments {
    PairedAttachments {
        first: folder1.get(index).map(Path::to_path_buf),
        second: folder2.get(index).map(Path::to_path_buf),
    }
}
