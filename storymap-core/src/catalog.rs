//! The curated catalog of story nodes.
//!
//! Every node is a geolocated mythological or cultural subject. The catalog
//! is fixed at build time; its order is the display order.

use std::fmt;

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for Coordinates {
    /// Formats as `[lat, lng]` using the formatter's precision (default 4).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = f.precision().unwrap_or(4);
        write!(f, "[{:.*}, {:.*}]", precision, self.lat, precision, self.lng)
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryNode {
    pub id: &'static str,
    pub title: &'static str,
    /// Grouping key for the selection panel.
    pub category: &'static str,
    /// Source dataset the node was curated from.
    pub dataset_origin: &'static str,
    pub coordinates: Coordinates,
    /// Map zoom level for the embeds.
    pub zoom: u8,
    pub description: &'static str,
    pub cultural_context: &'static str,
    pub visual_cue: &'static str,
}

/// The built-in catalog, in display order.
pub static STORY_NODES: &[StoryNode] = &[
    StoryNode {
        id: "ganesha-mouse",
        title: "Ganesha with Mouse",
        category: "Vedic",
        dataset_origin: "Hindu (1).csv",
        coordinates: Coordinates::new(40.21730800117694, 43.66722825233365),
        zoom: 9,
        description: "The remover of obstacles accompanied by his vehicle, the mouse.",
        cultural_context: "Symbolizes intellect conquering ego. Ganesha writes the destiny of the cosmos.",
        visual_cue: "Look for the elephantine ridge formation.",
    },
    StoryNode {
        id: "narasimha",
        title: "Narasimha",
        category: "Vedic",
        dataset_origin: "Hindu (1).csv",
        coordinates: Coordinates::new(35.56862515854041, 53.75416837733463),
        zoom: 11,
        description: "The Fourth Avatar of Vishnu: The Ugra (Fierce) Narasimha. He is the Great Protector who transcends boundaries.",
        cultural_context: "The destruction of Hiranyakashipu. By appearing as neither man nor beast, at twilight, and on a threshold, Narasimha bypasses the demon's boon to restore Cosmic Order (Dharma).",
        visual_cue: "Traditional Vedic iconography: Narasimha with a lion face and human torso, seated with the demon Hiranyakashipu across his lap, tearing his chest to protect the devotee Prahlada.",
    },
    StoryNode {
        id: "venus-de-milo",
        title: "Venus de Milo",
        category: "Classical",
        dataset_origin: "Classical.csv",
        coordinates: Coordinates::new(37.05608088058927, 21.182550427166646),
        zoom: 5,
        description: "Aphrodite, goddess of love.",
        cultural_context: "Beauty emerging from the sea.",
        visual_cue: "Graceful, feminine coastline curves.",
    },
    StoryNode {
        id: "pegasus",
        title: "Pegasus",
        category: "Classical",
        dataset_origin: "Classical.csv",
        coordinates: Coordinates::new(40.01165452533545, -14.303289416583354),
        zoom: 5,
        description: "The winged horse.",
        cultural_context: "Poetic inspiration and flight.",
        visual_cue: "Winged equine shape.",
    },
    StoryNode {
        id: "toucana",
        title: "Toucana",
        category: "Cosmic",
        dataset_origin: "Constellations.csv",
        coordinates: Coordinates::new(-71.46732686238668, -78.80093116617225),
        zoom: 4,
        description: "The Toucan.",
        cultural_context: "Southern skies exoticism.",
        visual_cue: "Bird with large beak.",
    },
    StoryNode {
        id: "chinese-dragon",
        title: "Chinese Dragon",
        category: "Cosmic",
        dataset_origin: "Year of the Dragon.csv",
        coordinates: Coordinates::new(31.36626268345984, 113.9110580617895),
        zoom: 5,
        description: "The Long.",
        cultural_context: "Power, strength, and good luck.",
        visual_cue: "Serpentine river or mountain range.",
    },
];

/// Nodes sharing a category, in catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup<'a> {
    pub category: &'a str,
    pub nodes: Vec<&'a StoryNode>,
}

/// Group nodes by category.
///
/// Groups appear in the order their category first occurs; nodes keep their
/// catalog order within a group.
pub fn grouped(nodes: &[StoryNode]) -> Vec<CategoryGroup<'_>> {
    let mut groups: Vec<CategoryGroup<'_>> = Vec::new();
    for node in nodes {
        match groups.iter_mut().find(|g| g.category == node.category) {
            Some(group) => group.nodes.push(node),
            None => groups.push(CategoryGroup {
                category: node.category,
                nodes: vec![node],
            }),
        }
    }
    groups
}

/// Nodes flattened in grouped display order.
pub fn display_order(nodes: &[StoryNode]) -> Vec<&StoryNode> {
    grouped(nodes)
        .into_iter()
        .flat_map(|g| g.nodes)
        .collect()
}

/// Look up a node by id.
pub fn find<'a>(nodes: &'a [StoryNode], id: &str) -> Option<&'a StoryNode> {
    nodes.iter().find(|n| n.id == id)
}
