mod flags;
mod settings;

pub use flags::FlagStore;
pub use settings::Settings;
