//! Liskov substitution with the rectangle/square example.
//!
//! `before` shows a square hidden behind a resizable-rectangle contract it
//! cannot honour; `after` shows both shapes behind an abstraction that makes
//! no promise about how dimensions relate.

use crate::module::{Brew, BrewContext};
use crate::registry::Registration;
use async_trait::async_trait;

pub fn registration() -> Registration {
    Registration::of::<LiskovBrew>(module_path!())
}

// =============================================================================
// Before: a contract the square breaks
// =============================================================================

/// Width and height can be set independently.
pub trait ResizableRectangle: Send + Sync {
    fn set_width(&mut self, width: u32);
    fn set_height(&mut self, height: u32);
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    fn area(&self) -> u32 {
        self.width() * self.height()
    }
}

#[derive(Debug, Default)]
pub struct Rectangle {
    width: u32,
    height: u32,
}

impl ResizableRectangle for Rectangle {
    fn set_width(&mut self, width: u32) {
        self.width = width;
    }

    fn set_height(&mut self, height: u32) {
        self.height = height;
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

/// Keeps both sides equal, so every setter changes the other side too.
#[derive(Debug, Default)]
pub struct CoupledSquare {
    side: u32,
}

impl ResizableRectangle for CoupledSquare {
    fn set_width(&mut self, width: u32) {
        self.side = width;
    }

    fn set_height(&mut self, height: u32) {
        self.side = height;
    }

    fn width(&self) -> u32 {
        self.side
    }

    fn height(&self) -> u32 {
        self.side
    }
}

/// Client code written against the rectangle contract.
pub fn resize_to_5x10(shape: &mut dyn ResizableRectangle) -> u32 {
    shape.set_width(5);
    shape.set_height(10);
    shape.area()
}

// =============================================================================
// After: independent shapes behind a weaker abstraction
// =============================================================================

pub trait Shape: Send + Sync {
    fn area(&self) -> u32;
    fn description(&self) -> String;
}

pub struct RectangleShape {
    pub width: u32,
    pub height: u32,
}

impl Shape for RectangleShape {
    fn area(&self) -> u32 {
        self.width * self.height
    }

    fn description(&self) -> String {
        format!("Rectangle ({}x{})", self.width, self.height)
    }
}

pub struct SquareShape {
    pub side: u32,
}

impl Shape for SquareShape {
    fn area(&self) -> u32 {
        self.side * self.side
    }

    fn description(&self) -> String {
        format!("Square ({0}x{0})", self.side)
    }
}

// =============================================================================
// Brew
// =============================================================================

#[derive(Default)]
pub struct LiskovBrew;

#[async_trait]
impl Brew for LiskovBrew {
    fn description(&self) -> Option<&str> {
        Some("SOLID: Liskov substitution with rectangles and squares")
    }

    async fn before(&self, ctx: &BrewContext) -> anyhow::Result<()> {
        let log = ctx.logger();
        log.info("=== BEFORE (violates LSP) ===");

        let mut rect = Rectangle::default();
        log.info(format!("Rectangle resized to 5x10: area {}", resize_to_5x10(&mut rect)));

        let mut square = CoupledSquare::default();
        let area = resize_to_5x10(&mut square);
        log.warn(format!(
            "Square as rectangle resized to 5x10: {}x{}, area {area} (expected 50)",
            square.width(),
            square.height()
        ));
        Ok(())
    }

    async fn execute(&self, ctx: &BrewContext) -> anyhow::Result<()> {
        ctx.checkpoint()?;
        Ok(())
    }

    async fn after(&self, ctx: &BrewContext) -> anyhow::Result<()> {
        let log = ctx.logger();
        log.info("=== AFTER (follows LSP) ===");

        let shapes: Vec<Box<dyn Shape>> = vec![
            Box::new(RectangleShape { width: 5, height: 10 }),
            Box::new(SquareShape { side: 7 }),
        ];
        for shape in &shapes {
            log.info(format!("{}: area = {}", shape.description(), shape.area()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_breaks_rectangle_contract() {
        assert_eq!(resize_to_5x10(&mut Rectangle::default()), 50);
        assert_eq!(resize_to_5x10(&mut CoupledSquare::default()), 100);
    }

    #[test]
    fn test_independent_shapes() {
        let shapes: Vec<Box<dyn Shape>> = vec![
            Box::new(RectangleShape { width: 5, height: 10 }),
            Box::new(SquareShape { side: 7 }),
        ];
        let areas: Vec<u32> = shapes.iter().map(|s| s.area()).collect();
        assert_eq!(areas, vec![50, 49]);
        assert_eq!(shapes[1].description(), "Square (7x7)");
    }
}
