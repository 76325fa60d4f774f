//! Rendering trait for diagram elements
//!
//! Members, entities, relationships and namespace nodes all produce a
//! fragment of PlantUML text. Templates call the same method on whatever
//! object they are given.

/// An element that renders to a PlantUML fragment
pub trait Render {
    /// Render this element as PlantUML text
    fn render(&self) -> String;
}

impl<T: Render + ?Sized> Render for &T {
    fn render(&self) -> String {
        (**self).render()
    }
}

impl<T: Render + ?Sized> Render for Box<T> {
    fn render(&self) -> String {
        (**self).render()
    }
}
