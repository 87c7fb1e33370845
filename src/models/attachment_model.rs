//! models/attachment_model.rs
//! Imágenes embebidas, carpetas de adjuntos y archivos subidos.

use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

/// Content-id del logo en la cabecera del correo.
pub const LOGO_CID: &str = "upt_logo";
/// Content-id del flyer debajo del cuerpo.
pub const FLYER_CID: &str = "flyer_img";

/// Tipo de imagen subida desde la UI ("logo" | "flyer").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Logo,
    Flyer,
}

impl AssetKind {
    pub fn content_id(self) -> &'static str {
        match self {
            AssetKind::Logo => LOGO_CID,
            AssetKind::Flyer => FLYER_CID,
        }
    }
}

impl FromStr for AssetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "logo" => Ok(AssetKind::Logo),
            "flyer" => Ok(AssetKind::Flyer),
            other => Err(format!("Tipo de asset no soportado: {}", other)),
        }
    }
}

/// content-id -> ruta en disco. Una entrada ausente deja la referencia `cid:` sin resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetMap {
    entries: BTreeMap<String, PathBuf>,
}

impl AssetMap {
    pub fn insert(&mut self, content_id: impl Into<String>, path: impl Into<PathBuf>) {
        self.entries.insert(content_id.into(), path.into());
    }

    pub fn get(&self, content_id: &str) -> Option<&Path> {
        self.entries.get(content_id).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_path()))
    }
}

/// Las dos carpetas de adjuntos independientes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderKind {
    Folder1,
    Folder2,
}

impl FolderKind {
    pub fn dir_name(self) -> &'static str {
        match self {
            FolderKind::Folder1 => "folder1",
            FolderKind::Folder2 => "folder2",
        }
    }
}

impl FromStr for FolderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "folder1" => Ok(FolderKind::Folder1),
            "folder2" => Ok(FolderKind::Folder2),
            other => Err(format!("Carpeta no soportada: {}", other)),
        }
    }
}

/// Rutas ya ordenadas por la clave numérica del nombre original.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentSequence {
    paths: Vec<PathBuf>,
}

impl AttachmentSequence {
    /// Se asume que `paths` ya viene ordenado (ver `attachment_service::sort_by_numeric_key`).
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Archivo recibido en un formulario multipart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Formulario multipart ya leído: archivos en orden de llegada y campos de texto.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub files: Vec<UploadedFile>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|v| v.trim())
    }

    /// Primer archivo del formulario (las rutas de un solo archivo usan `file`).
    pub fn take_file(&mut self) -> Option<UploadedFile> {
        if self.files.is_empty() {
            None
        } else {
            Some(self.files.remove(0))
        }
    }
}
