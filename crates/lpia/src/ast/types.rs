//! Declared types

use std::fmt;

/// Type written in a declaration, e.g. `int` or `list[list[float]]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeName {
    Int,
    Float,
    Str,
    Bool,
    List(Box<TypeName>),
    /// Loop variables whose element type cannot be determined statically
    Unknown,
}

impl TypeName {
    pub fn list_of(element: TypeName) -> Self {
        TypeName::List(Box::new(element))
    }

    /// Type of one element when iterating a value of this type
    pub fn element(&self) -> TypeName {
        match self {
            TypeName::List(inner) => (**inner).clone(),
            TypeName::Str => TypeName::Str,
            _ => TypeName::Unknown,
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeName::Int => write!(f, "int"),
            TypeName::Float => write!(f, "float"),
            TypeName::Str => write!(f, "string"),
            TypeName::Bool => write!(f, "bool"),
            TypeName::List(inner) => write!(f, "list[{inner}]"),
            TypeName::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_nests() {
        let ty = TypeName::list_of(TypeName::list_of(TypeName::Int));
        assert_eq!(ty.to_string(), "list[list[int]]");
        assert_eq!(ty.element().to_string(), "list[int]");
    }

    #[test]
    fn test_element_of_scalars() {
        assert_eq!(TypeName::Str.element(), TypeName::Str);
        assert_eq!(TypeName::Int.element(), TypeName::Unknown);
    }
}
