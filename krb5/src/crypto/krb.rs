mod enctype;
mod keyblock;
mod keytype;
mod string_to_key;

pub use self::{
    enctype::Enctype, keyblock::Keyblock, keytype::Keytype, string_to_key::string_to_key,
};
