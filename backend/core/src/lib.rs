pub mod error;
pub mod event;
pub mod params;
pub mod traits;

pub use error::SyncError;
pub use event::{Notice, NoticeLevel, WidgetEvent};
pub use params::{
    DeviceKind, EnvironmentInfo, FormState, PageContext, ParameterSet, SessionCounters,
};
pub use traits::{KeyValueStore, PageSink, Widget, WidgetFactory};
