// Application layer - Use case interactors

pub mod batch_interactor;
pub mod container;
pub mod inspect_interactor;
pub mod montage_interactor;

// Re-export interactors
pub use batch_interactor::{BatchInteractor, BatchReport};
pub use container::{AppContainer, DefaultAppContainer};
pub use inspect_interactor::{InspectInteractor, InspectReport};
pub use montage_interactor::{MontageInteractor, MontageReport};
