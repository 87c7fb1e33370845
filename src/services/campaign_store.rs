//! services/campaign_store.rs
//! Estado en memoria entre requests: destinatarios, imágenes, carpetas y el
//! último reporte publicado. Nada se persiste.

use std::{
    collections::BTreeMap,
    path::PathBuf,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, PoisonError, RwLock,
    },
};

use arc_swap::ArcSwap;

use crate::models::{
    attachment_model::{AssetKind, AssetMap, AttachmentSequence, FolderKind},
    recipient_model::Recipient,
    report_model::Report,
};

/// Entrada inmutable de una corrida, construida al aceptar el envío.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunInput {
    pub recipients: Vec<Recipient>,
    pub assets: AssetMap,
    pub folder1: AttachmentSequence,
    pub folder2: AttachmentSequence,
}

#[derive(Debug, Default)]
struct Ingested {
    recipients: Vec<Recipient>,
    assets: BTreeMap<AssetKind, PathBuf>,
    folder1: Vec<PathBuf>,
    folder2: Vec<PathBuf>,
}

#[derive(Clone, Default)]
pub struct CampaignStore {
    ingested: Arc<RwLock<Ingested>>,
    report: Arc<ArcSwap<Report>>,
    generation: Arc<AtomicU64>,
}

impl CampaignStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_recipients(&self, recipients: Vec<Recipient>) {
        self.write(|state| state.recipients = recipients);
    }

    pub fn set_asset(&self, kind: AssetKind, path: PathBuf) {
        self.write(|state| {
            state.assets.insert(kind, path);
        });
    }

    /// `paths` ya debe venir en orden numérico.
    pub fn set_folder(&self, folder: FolderKind, paths: Vec<PathBuf>) {
        self.write(|state| match folder {
            FolderKind::Folder1 => state.folder1 = paths,
            FolderKind::Folder2 => state.folder2 = paths,
        });
    }

    pub fn recipient_count(&self) -> usize {
        self.read(|state| state.recipients.len())
    }

    pub fn recipients_preview(&self, limit: usize) -> Vec<Recipient> {
        self.read(|state| state.recipients.iter().take(limit).cloned().collect())
    }

    /// Copia del estado para una corrida; las imágenes quedan indexadas por content-id.
    pub fn snapshot(&self) -> RunInput {
        self.read(|state| {
            let mut assets = AssetMap::default();
            for (kind, path) in &state.assets {
                assets.insert(kind.content_id(), path.clone());
            }
            RunInput {
                recipients: state.recipients.clone(),
                assets,
                folder1: AttachmentSequence::new(state.folder1.clone()),
                folder2: AttachmentSequence::new(state.folder2.clone()),
            }
        })
    }

    pub fn report(&self) -> Arc<Report> {
        self.report.load_full()
    }

    /// Reemplaza el reporte anterior de una sola vez.
    pub fn publish(&self, report: Report) {
        self.report.store(Arc::new(report));
    }

    /// Cambia con cada `reset`; una corrida iniciada antes no publica después.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Publica solo si no hubo un `reset` desde `generation`. La comparación y
    /// el reemplazo ocurren bajo el mismo lock de escritura que usa `reset`.
    pub fn publish_for(&self, generation: u64, report: Report) -> bool {
        let _guard = self.ingested.write().unwrap_or_else(PoisonError::into_inner);
        if self.generation() != generation {
            return false;
        }
        self.publish(report);
        true
    }

    /// Descarta todo el estado de la campaña. Idempotente.
    pub fn reset(&self) {
        self.write(|state| {
            *state = Ingested::default();
            self.report.store(Arc::new(Report::default()));
            self.generation.fetch_add(1, Ordering::SeqCst);
        });
    }

    fn read<T>(&self, f: impl FnOnce(&Ingested) -> T) -> T {
        let guard = self.ingested.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write(&self, f: impl FnOnce(&mut Ingested)) {
        let mut guard = self.ingested.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::models::attachment_model::{FLYER_CID, LOGO_CID};

    fn loaded_store() -> CampaignStore {
        let store = CampaignStore::new();
        store.set_recipients(vec![Recipient::from_pairs([("Correo", "a@gmail.com")])]);
        store.set_asset(AssetKind::Logo, PathBuf::from("temp/assets/logo.png"));
        store.set_folder(FolderKind::Folder2, vec![PathBuf::from("temp/assets/folder2/1.pdf")]);
        store.publish(Report::new("run-1", vec![]));
        store
    }

    #[test]
    fn snapshot_maps_assets_to_content_ids() {
        let input = loaded_store().snapshot();
        assert_eq!(input.recipients.len(), 1);
        assert_eq!(
            input.assets.get(LOGO_CID),
            Some(PathBuf::from("temp/assets/logo.png").as_path())
        );
        assert_eq!(input.assets.get(FLYER_CID), None);
        assert!(input.folder1.is_empty());
        assert_eq!(input.folder2.len(), 1);
    }

    #[test]
    fn reset_twice_equals_reset_once() {
        let store = loaded_store();
        store.reset();
        let once = (store.snapshot(), store.report());
        store.reset();
        let twice = (store.snapshot(), store.report());

        assert_eq!(once, twice);
        assert_eq!(twice.0, RunInput::default());
        assert!(twice.1.is_empty());
        assert_eq!(store.recipient_count(), 0);
    }

    #[test]
    fn publish_waits_for_an_in_flight_reset() {
        let store = loaded_store();
        let generation = store.generation();

        // reset a medio camino: lock tomado, generación todavía sin cambiar
        let guard = store.ingested.write().unwrap();
        let publisher = {
            let store = store.clone();
            std::thread::spawn(move || store.publish_for(generation, Report::new("stale", vec![])))
        };
        std::thread::sleep(Duration::from_millis(50));
        store.report.store(Arc::new(Report::default()));
        store.generation.fetch_add(1, Ordering::SeqCst);
        drop(guard);

        assert!(!publisher.join().unwrap());
        assert_eq!(store.report().run_id, None);
    }

    #[test]
    fn stale_run_does_not_publish_after_reset() {
        let store = loaded_store();
        let generation = store.generation();
        store.reset();

        assert!(!store.publish_for(generation, Report::new("old", vec![])));
        assert_eq!(store.report().run_id, None);
        assert!(store.publish_for(store.generation(), Report::new("new", vec![])));
        assert_eq!(store.report().run_id.as_deref(), Some("new"));
    }
}
