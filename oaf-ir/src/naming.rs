//! Identifier helpers shared by the IR and the builder.

/// Convert a string to PascalCase (e.g., "pet_type" -> "PetType", "pets" -> "Pets")
///
/// Splits on `_`, `-`, `.` and spaces; the rest of each part keeps its case.
pub fn to_pascal_case(s: &str) -> String {
    s.split(['_', '-', '.', ' '])
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => c.to_uppercase().chain(chars).collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case("hello"), "Hello");
        assert_eq!(to_pascal_case("hello_world"), "HelloWorld");
        assert_eq!(to_pascal_case("pet-type"), "PetType");
        assert_eq!(to_pascal_case("petType"), "PetType");
        assert_eq!(to_pascal_case("v1.pets"), "V1Pets");
        assert_eq!(to_pascal_case(""), "");
    }
}
