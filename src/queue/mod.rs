pub mod events;
pub mod manager;
pub mod record;

pub use events::QueueEvent;
pub use manager::LifecycleManager;
pub use record::{
    AcquisitionId, AcquisitionRecord, AcquisitionRequest, AcquisitionStatus, EtaDisplay,
    IdGenerator, Transition,
};
