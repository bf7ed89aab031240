mod location;
mod storage;

pub use self::location::{
    DeviceFix, FixOptions, Location, LocationError, LocationOperation, LocationResult,
};
pub use self::storage::{Storage, StorageError, StorageOperation, StorageOutput, StorageResult};

pub use crux_core::render::Render;
pub use crux_http::Http;

use crate::app::{App, Event};

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub http: Http<Event>,
    pub location: Location<Event>,
    pub storage: Storage<Event>,
}
