//! Designer-facing effect parameters.

use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Parameters of one effect, edited by designers and read once per frame.
pub trait VolumeComponent: Any {
    /// Whether the effect should run this frame.
    fn is_active(&self) -> bool;

    /// Whether the effect can run with tiled (on-chip) rendering.
    fn is_tile_compatible(&self) -> bool;
}

/// The resolved parameters of every effect for the current camera.
#[derive(Default)]
pub struct VolumeStack {
    components: HashMap<TypeId, Box<dyn Any>>,
}

impl VolumeStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the parameters of an effect, replacing the previous ones.
    pub fn set<T: VolumeComponent>(&mut self, component: T) {
        self.components
            .insert(TypeId::of::<T>(), Box::new(component));
    }

    /// The parameters of an effect, if the stack has any.
    pub fn get<T: VolumeComponent>(&self) -> Option<&T> {
        self.components
            .get(&TypeId::of::<T>())
            .and_then(|c| c.downcast_ref())
    }

    /// Mutable access to the parameters of an effect.
    pub fn get_mut<T: VolumeComponent>(&mut self) -> Option<&mut T> {
        self.components
            .get_mut(&TypeId::of::<T>())
            .and_then(|c| c.downcast_mut())
    }

    /// Removes and returns the parameters of an effect.
    pub fn remove<T: VolumeComponent>(&mut self) -> Option<T> {
        self.components
            .remove(&TypeId::of::<T>())
            .and_then(|c| c.downcast().ok())
            .map(|c| *c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Fog(bool);

    impl VolumeComponent for Fog {
        fn is_active(&self) -> bool {
            self.0
        }

        fn is_tile_compatible(&self) -> bool {
            true
        }
    }

    #[test]
    fn components_are_keyed_by_type() {
        let mut volumes = VolumeStack::new();
        assert!(volumes.get::<Fog>().is_none());

        volumes.set(Fog(false));
        volumes.set(Fog(true));
        assert_eq!(volumes.get::<Fog>(), Some(&Fog(true)));

        if let Some(fog) = volumes.get_mut::<Fog>() {
            fog.0 = false;
        }
        assert_eq!(volumes.remove::<Fog>(), Some(Fog(false)));
        assert!(volumes.get::<Fog>().is_none());
    }
}
