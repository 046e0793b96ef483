//! Layers and the layer stack.

use crate::element::{Element, ElementId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Layer identifier.
pub type LayerId = String;

/// Id of the layer every fresh board starts with.
pub const DEFAULT_LAYER_ID: &str = "default";

/// An ordered, independently visible and lockable collection of elements.
///
/// Element order is paint order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub elements: Vec<Element>,
}

fn default_true() -> bool {
    true
}

impl Layer {
    /// Create a new empty, visible, unlocked layer.
    pub fn new(id: impl Into<LayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            visible: true,
            locked: false,
            elements: Vec::new(),
        }
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id() == id)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id() == id)
    }

    /// Topmost well-formed element accepted by `pred`.
    pub fn topmost(&self, pred: impl Fn(&Element) -> bool) -> Option<&Element> {
        self.elements
            .iter()
            .rev()
            .filter(|e| e.is_well_formed())
            .find(|e| pred(*e))
    }

    /// Replace the element with the same id. Returns false if it is gone.
    pub fn replace(&mut self, element: Element) -> bool {
        match self.element_mut(element.id()) {
            Some(slot) => {
                *slot = element;
                true
            }
            None => false,
        }
    }

    /// Remove every element matching `pred`; returns how many were removed.
    pub fn remove_where(&mut self, pred: impl Fn(&Element) -> bool) -> usize {
        let before = self.elements.len();
        self.elements.retain(|e| !pred(e));
        before - self.elements.len()
    }
}

/// Direction of a layer reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerMove {
    /// Swap with the previous layer in sequence order.
    Up,
    /// Swap with the next layer in sequence order.
    Down,
}

/// The board's layers plus the active-layer pointer.
///
/// Never empty, and the active id always names an existing layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerStack {
    layers: Vec<Layer>,
    active: LayerId,
}

impl Default for LayerStack {
    fn default() -> Self {
        Self {
            layers: vec![Layer::new(DEFAULT_LAYER_ID, "Default Layer")],
            active: DEFAULT_LAYER_ID.to_string(),
        }
    }
}

impl LayerStack {
    /// Rebuild a stack from persisted parts. Returns `None` if `layers` is
    /// empty or `active` names no layer.
    pub fn from_parts(layers: Vec<Layer>, active: LayerId) -> Option<Self> {
        if !layers.iter().any(|l| l.id == active) {
            return None;
        }
        Some(Self { layers, active })
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Layer> {
        self.layers.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    pub fn active_id(&self) -> &str {
        &self.active
    }

    pub fn active(&self) -> &Layer {
        let idx = self.index_of(&self.active).unwrap_or(0);
        &self.layers[idx]
    }

    pub fn active_mut(&mut self) -> &mut Layer {
        let idx = self.index_of(&self.active).unwrap_or(0);
        &mut self.layers[idx]
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    /// Append a new empty layer named "Layer N" and make it active.
    pub fn add(&mut self) -> LayerId {
        let id = Uuid::now_v7().to_string();
        let name = format!("Layer {}", self.layers.len() + 1);
        self.layers.push(Layer::new(id.clone(), name));
        self.active = id.clone();
        id
    }

    /// Delete a layer and all its elements.
    ///
    /// Refuses to delete the last remaining layer. If the deleted layer was
    /// active, the first remaining layer becomes active.
    pub fn delete(&mut self, id: &str) -> bool {
        if self.layers.len() <= 1 {
            return false;
        }
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        self.layers.remove(idx);
        if self.active == id {
            self.active = self.layers[0].id.clone();
        }
        true
    }

    pub fn set_visible(&mut self, id: &str, visible: bool) -> bool {
        match self.get_mut(id) {
            Some(layer) => {
                layer.visible = visible;
                true
            }
            None => false,
        }
    }

    pub fn set_locked(&mut self, id: &str, locked: bool) -> bool {
        match self.get_mut(id) {
            Some(layer) => {
                layer.locked = locked;
                true
            }
            None => false,
        }
    }

    /// Swap a layer with its neighbour. No-op (returns false) at either end.
    pub fn move_layer(&mut self, id: &str, direction: LayerMove) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        let target = match direction {
            LayerMove::Up => idx.checked_sub(1),
            LayerMove::Down => Some(idx + 1).filter(|&t| t < self.layers.len()),
        };
        match target {
            Some(target) => {
                self.layers.swap(idx, target);
                true
            }
            None => false,
        }
    }

    /// Make `id` the active layer.
    pub fn select(&mut self, id: &str) -> bool {
        if self.index_of(id).is_none() {
            return false;
        }
        self.active = id.to_string();
        true
    }

    /// Empty every layer.
    pub fn clear_all(&mut self) {
        for layer in &mut self.layers {
            layer.elements.clear();
        }
    }

    /// Find an element in any layer.
    pub fn find(&self, id: ElementId) -> Option<(&Layer, &Element)> {
        self.layers
            .iter()
            .find_map(|l| l.element(id).map(|e| (l, e)))
    }
}
