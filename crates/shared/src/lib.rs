pub mod domain;
pub mod error;
pub mod naming;
pub mod properties;
pub mod protocol;
pub mod table_state;
pub mod validation;
