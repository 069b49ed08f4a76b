pub mod inspect;
pub mod islands;
pub mod subset;
