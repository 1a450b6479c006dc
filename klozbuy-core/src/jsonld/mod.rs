//! Minimal schema.org JSON-LD builder.
//!
//! Nodes are plain JSON objects tagged with an `@type`. Nesting one node under
//! another goes through [`NESTING_RULES`], so a document can only take shapes
//! that search engines understand.

mod documents;

pub use documents::{business_profile_document, post_document};

use crate::common::error::{KlozbuyError, Result};
use serde_json::{Map, Value};
use std::fmt;

pub const SCHEMA_ORG_CONTEXT: &str = "https://schema.org";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    LocalBusiness,
    Organization,
    Person,
    PostalAddress,
    GeoCoordinates,
    OpeningHoursSpecification,
    SocialMediaPosting,
    Product,
    Offer,
    Event,
    Place,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::LocalBusiness => "LocalBusiness",
            NodeType::Organization => "Organization",
            NodeType::Person => "Person",
            NodeType::PostalAddress => "PostalAddress",
            NodeType::GeoCoordinates => "GeoCoordinates",
            NodeType::OpeningHoursSpecification => "OpeningHoursSpecification",
            NodeType::SocialMediaPosting => "SocialMediaPosting",
            NodeType::Product => "Product",
            NodeType::Offer => "Offer",
            NodeType::Event => "Event",
            NodeType::Place => "Place",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(parent, property, allowed child types)`.
pub static NESTING_RULES: &[(NodeType, &str, &[NodeType])] = &[
    (NodeType::LocalBusiness, "address", &[NodeType::PostalAddress]),
    (NodeType::LocalBusiness, "geo", &[NodeType::GeoCoordinates]),
    (
        NodeType::LocalBusiness,
        "openingHoursSpecification",
        &[NodeType::OpeningHoursSpecification],
    ),
    (
        NodeType::SocialMediaPosting,
        "author",
        &[NodeType::Person, NodeType::Organization],
    ),
    (NodeType::SocialMediaPosting, "contentLocation", &[NodeType::Place]),
    (NodeType::Product, "offers", &[NodeType::Offer]),
    (
        NodeType::Offer,
        "seller",
        &[NodeType::Person, NodeType::Organization],
    ),
    (NodeType::Event, "location", &[NodeType::Place]),
    (
        NodeType::Event,
        "organizer",
        &[NodeType::Person, NodeType::Organization],
    ),
    (NodeType::Event, "offers", &[NodeType::Offer]),
    (NodeType::Place, "address", &[NodeType::PostalAddress]),
    (NodeType::Place, "geo", &[NodeType::GeoCoordinates]),
];

/// Whether `child` may appear under `parent.property`.
pub fn may_nest(parent: NodeType, property: &str, child: NodeType) -> bool {
    NESTING_RULES
        .iter()
        .any(|(p, prop, children)| *p == parent && *prop == property && children.contains(&child))
}

#[derive(Debug, Clone)]
pub struct Node {
    node_type: NodeType,
    properties: Map<String, Value>,
}

impl Node {
    pub fn new(node_type: NodeType) -> Self {
        let mut properties = Map::new();
        properties.insert("@type".to_string(), Value::from(node_type.as_str()));
        Self {
            node_type,
            properties,
        }
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// Set `key` only when a value is present.
    pub fn optional<V: Into<Value>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.property(key, value),
            None => self,
        }
    }

    pub fn nest(mut self, key: &str, child: Node) -> Result<Self> {
        self.check_nesting(key, &child)?;
        self.properties.insert(key.to_string(), child.into_value());
        Ok(self)
    }

    /// Nest a list of children. An empty list leaves the property unset.
    pub fn nest_many(mut self, key: &str, children: Vec<Node>) -> Result<Self> {
        if children.is_empty() {
            return Ok(self);
        }
        let mut values = Vec::with_capacity(children.len());
        for child in children {
            self.check_nesting(key, &child)?;
            values.push(child.into_value());
        }
        self.properties.insert(key.to_string(), Value::Array(values));
        Ok(self)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.properties)
    }

    /// Finish a top-level node as a standalone JSON-LD document.
    pub fn into_document(mut self) -> Value {
        self.properties
            .insert("@context".to_string(), Value::from(SCHEMA_ORG_CONTEXT));
        self.into_value()
    }

    fn check_nesting(&self, key: &str, child: &Node) -> Result<()> {
        if may_nest(self.node_type, key, child.node_type) {
            Ok(())
        } else {
            Err(KlozbuyError::StructuredData(format!(
                "{} cannot be nested under {}.{}",
                child.node_type, self.node_type, key
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_carries_context_and_type() {
        let doc = Node::new(NodeType::Place)
            .property("name", "Balogun Market")
            .into_document();
        assert_eq!(doc["@context"], SCHEMA_ORG_CONTEXT);
        assert_eq!(doc["@type"], "Place");
        assert_eq!(doc["name"], "Balogun Market");
    }

    #[test]
    fn allowed_nesting_is_inlined() {
        let doc = Node::new(NodeType::LocalBusiness)
            .nest(
                "address",
                Node::new(NodeType::PostalAddress).property("addressLocality", "Lagos"),
            )
            .expect("address is allowed")
            .into_document();
        assert_eq!(doc["address"]["@type"], "PostalAddress");
        assert!(doc["address"].get("@context").is_none());
    }

    #[test]
    fn disallowed_nesting_is_an_error() {
        let err = Node::new(NodeType::Product)
            .nest("offers", Node::new(NodeType::Person))
            .expect_err("person is not an offer");
        assert!(matches!(err, KlozbuyError::StructuredData(_)));

        let err = Node::new(NodeType::Place)
            .nest("author", Node::new(NodeType::Person))
            .expect_err("places have no author rule");
        assert_eq!(
            err.to_string(),
            "Structured data error: Person cannot be nested under Place.author"
        );
    }

    #[test]
    fn optional_skips_missing_values() {
        let doc = Node::new(NodeType::Person)
            .optional("email", None::<String>)
            .optional("name", Some("Ada"))
            .into_value();
        assert!(doc.get("email").is_none());
        assert_eq!(doc["name"], "Ada");
    }

    #[test]
    fn empty_lists_are_left_out() {
        let doc = Node::new(NodeType::LocalBusiness)
            .nest_many("openingHoursSpecification", Vec::new())
            .expect("empty list")
            .into_value();
        assert!(doc.get("openingHoursSpecification").is_none());
    }
}
