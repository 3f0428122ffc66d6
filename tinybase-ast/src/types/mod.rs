mod data_type;
mod ident;
mod literal;

pub use self::{data_type::*, ident::*, literal::*};
