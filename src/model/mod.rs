pub mod class;
pub mod entity;
pub mod properties;
pub mod settings;

pub use class::{Getter, ModelClass, Setter};
pub use entity::{Entity, ModelBase};
pub use properties::{Properties, PropertyDeclaration, PropertyDefinition};
pub use settings::ModelSettings;
