pub mod liskov_substitution;
