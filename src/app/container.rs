use std::sync::Arc;

use crate::adapters::{FsOutputAdapter, ImageCrateCodec};
use crate::app::{
    batch_interactor::BatchInteractor, inspect_interactor::InspectInteractor,
    montage_interactor::MontageInteractor,
};
use crate::ports::{ImageCodec, MediaDecoder, OutputPort, ProbePort};

pub trait AppContainer: Send + Sync {
    fn montage_interactor(&self) -> Arc<MontageInteractor>;
    fn batch_interactor(&self) -> Arc<BatchInteractor>;
    fn inspect_interactor(&self) -> Arc<InspectInteractor>;
}

pub struct DefaultAppContainer {
    montage_interactor: Arc<MontageInteractor>,
    batch_interactor: Arc<BatchInteractor>,
    inspect_interactor: Arc<InspectInteractor>,
}

impl DefaultAppContainer {
    /// Wire the libav decoder and probe with the filesystem output
    #[cfg(feature = "libav")]
    pub fn new() -> crate::error::MontageResult<Self> {
        use crate::adapters::{LibavDecoder, ProbeLibavAdapter};

        Ok(Self::with_ports(
            Arc::new(ProbeLibavAdapter::new()?),
            Arc::new(LibavDecoder::new()?),
            Arc::new(ImageCrateCodec::new()),
            Arc::new(FsOutputAdapter::new()),
        ))
    }

    /// Wire custom probe and decoder ports with the default codec and output
    pub fn with_media(probe_port: Arc<dyn ProbePort>, decoder: Arc<dyn MediaDecoder>) -> Self {
        Self::with_ports(
            probe_port,
            decoder,
            Arc::new(ImageCrateCodec::new()),
            Arc::new(FsOutputAdapter::new()),
        )
    }

    pub fn with_ports(
        probe_port: Arc<dyn ProbePort>,
        decoder: Arc<dyn MediaDecoder>,
        codec: Arc<dyn ImageCodec>,
        output_port: Arc<dyn OutputPort>,
    ) -> Self {
        let montage_interactor = Arc::new(MontageInteractor::new(
            Arc::clone(&probe_port),
            decoder,
            codec,
            output_port,
        ));

        let batch_interactor = Arc::new(BatchInteractor::new(Arc::clone(&montage_interactor)));
        let inspect_interactor = Arc::new(InspectInteractor::new(probe_port));

        Self {
            montage_interactor,
            batch_interactor,
            inspect_interactor,
        }
    }
}

impl AppContainer for DefaultAppContainer {
    fn montage_interactor(&self) -> Arc<MontageInteractor> {
        Arc::clone(&self.montage_interactor)
    }

    fn batch_interactor(&self) -> Arc<BatchInteractor> {
        Arc::clone(&self.batch_interactor)
    }

    fn inspect_interactor(&self) -> Arc<InspectInteractor> {
        Arc::clone(&self.inspect_interactor)
    }
}
