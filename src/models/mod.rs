pub mod circulaire;
pub mod enums;
pub mod medication;

pub use circulaire::*;
pub use enums::*;
pub use medication::*;
