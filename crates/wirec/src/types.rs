use std::fmt;

use crate::language::keywords;
use crate::validate;

/// Semantic type of one message field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    Int32,
    UInt32,
    Bool,
    BoundedString { capacity: u16 },
    List(Box<TypeDescriptor>),
    MessageRef(String),
}

impl TypeDescriptor {
    /// Parses the type part of a field line, e.g. `list string 32`.
    pub fn parse_tokens(tokens: &[String]) -> Result<Self, String> {
        let (ty, rest) = Self::parse_prefix(tokens)?;
        if !rest.is_empty() {
            return Err(format!(
                "unexpected tokens after type `{ty}`: {}",
                rest.join(" ")
            ));
        }
        Ok(ty)
    }

    fn parse_prefix(tokens: &[String]) -> Result<(Self, &[String]), String> {
        let Some((head, rest)) = tokens.split_first() else {
            return Err("missing type".to_string());
        };
        match head.as_str() {
            keywords::INT => Ok((TypeDescriptor::Int32, rest)),
            keywords::UINT => Ok((TypeDescriptor::UInt32, rest)),
            keywords::BOOL => Ok((TypeDescriptor::Bool, rest)),
            keywords::LIST => {
                if rest.is_empty() {
                    return Err("`list` needs an element type".to_string());
                }
                let (inner, rest) = Self::parse_prefix(rest)?;
                Ok((TypeDescriptor::List(Box::new(inner)), rest))
            }
            keywords::STRING => match rest.split_first() {
                Some((tok, tail)) if tok.starts_with(|c: char| c.is_ascii_digit()) => {
                    let capacity = parse_capacity(tok)?;
                    Ok((TypeDescriptor::BoundedString { capacity }, tail))
                }
                _ => Ok((
                    TypeDescriptor::BoundedString {
                        capacity: keywords::DEFAULT_STRING_CAPACITY,
                    },
                    rest,
                )),
            },
            name => {
                validate::validate_type_name(name)?;
                Ok((TypeDescriptor::MessageRef(name.to_string()), rest))
            }
        }
    }

    /// Rust spelling of the type in generated code.
    pub fn rust_type(&self, runtime_crate: &str) -> String {
        match self {
            TypeDescriptor::Int32 => "i32".to_string(),
            TypeDescriptor::UInt32 => "u32".to_string(),
            TypeDescriptor::Bool => "bool".to_string(),
            TypeDescriptor::BoundedString { capacity } => {
                format!("::{runtime_crate}::BoundedString<{capacity}>")
            }
            TypeDescriptor::List(inner) => format!("Vec<{}>", inner.rust_type(runtime_crate)),
            TypeDescriptor::MessageRef(name) => name.clone(),
        }
    }

    /// The message this type refers to, looking through any number of `list` wrappers.
    pub fn referenced_message(&self) -> Option<&str> {
        match self {
            TypeDescriptor::List(inner) => inner.referenced_message(),
            TypeDescriptor::MessageRef(name) => Some(name),
            _ => None,
        }
    }

    /// The message embedded by value, i.e. not behind a `list`.
    pub fn embedded_message(&self) -> Option<&str> {
        match self {
            TypeDescriptor::MessageRef(name) => Some(name),
            _ => None,
        }
    }
}

fn parse_capacity(tok: &str) -> Result<u16, String> {
    let cap: u32 = tok
        .parse()
        .map_err(|_| format!("invalid string capacity {tok:?}"))?;
    match u16::try_from(cap) {
        Ok(cap) if cap > 0 => Ok(cap),
        _ => Err(format!(
            "string capacity must be in 1..={}, got {tok}",
            u16::MAX
        )),
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Int32 => f.write_str(keywords::INT),
            TypeDescriptor::UInt32 => f.write_str(keywords::UINT),
            TypeDescriptor::Bool => f.write_str(keywords::BOOL),
            TypeDescriptor::BoundedString { capacity } => {
                write!(f, "{} {capacity}", keywords::STRING)
            }
            TypeDescriptor::List(inner) => write!(f, "{} {inner}", keywords::LIST),
            TypeDescriptor::MessageRef(name) => f.write_str(name),
        }
    }
}
