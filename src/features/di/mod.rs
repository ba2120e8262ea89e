pub mod poor_mans_di;
