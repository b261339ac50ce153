//! Significant-properties merger
//!
//! A package records its significant properties in a PREMIS document:
//!
//! ```xml
//! <premis:premis xmlns:premis="http://www.loc.gov/premis/v3" ...>
//!   <premis:object xsi:type="premis:intellectualEntity">
//!     <premis:objectIdentifier>...</premis:objectIdentifier>
//!     <premis:significantProperties>
//!       <premis:significantPropertiesType>content</premis:significantPropertiesType>
//!       <premis:significantPropertiesValue>...</premis:significantPropertiesValue>
//!     </premis:significantProperties>
//!   </premis:object>
//! </premis:premis>
//! ```
//!
//! [`SignificantProperties`] owns one parsed document for the duration of a
//! stage. It exposes the typed properties as a [`MetadataStore`] (type name to
//! scalar value) so the metadata operator can edit them, and patches the
//! operator's result back into the tree:
//!
//! 1. Existing properties whose type is in the new store get their value
//!    replaced.
//! 2. Types present in the new store but not in the tree are appended to the
//!    object element, in canonical type order, after all existing children.
//! 3. Whitespace around appended elements is rewritten so the serialized
//!    document keeps its nested two-space indentation.
//!
//! The document lives in a `xot` arena; nodes are plain indices into it and
//! all mutation goes through the owning [`Xot`].

use std::fs;
use std::path::Path;

use log::debug;
use xot::{NameId, Node, Xot};

use crate::error::{Error, Result};
use crate::report::{origin, Log};
use crate::store::MetadataStore;

/// PREMIS v3 namespace
pub const PREMIS_NAMESPACE: &str = "http://www.loc.gov/premis/v3";

/// Recognized property types in canonical order
pub const SIGNIFICANT_PROPERTY_TYPES: [&str; 5] =
    ["content", "context", "appearance", "behavior", "structure"];

/// Document used when a package has no significant-properties file
pub const TEMPLATE: &str = r#"<premis:premis xmlns:premis="http://www.loc.gov/premis/v3" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://www.loc.gov/premis/v3 https://www.loc.gov/standards/premis/premis.xsd" version="3.0">
  <premis:object xsi:type="premis:intellectualEntity">
    <premis:objectIdentifier>
      <premis:objectIdentifierType>Relative path</premis:objectIdentifierType>
      <premis:objectIdentifierValue>../data/</premis:objectIdentifierValue>
    </premis:objectIdentifier>
  </premis:object>
</premis:premis>
"#;

/// Type ordering and indentation used when appending properties
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigPropLayout {
    /// Canonical type order; only these types are ever appended.
    pub types: Vec<String>,
    /// One level of indentation.
    pub indent: String,
}

impl Default for SigPropLayout {
    fn default() -> Self {
        Self {
            types: SIGNIFICANT_PROPERTY_TYPES.iter().map(|t| t.to_string()).collect(),
            indent: "  ".to_string(),
        }
    }
}

struct Names {
    object: NameId,
    property: NameId,
    property_type: NameId,
    property_value: NameId,
}

impl Names {
    fn register(xot: &mut Xot) -> Self {
        let premis = xot.add_namespace(PREMIS_NAMESPACE);
        Self {
            object: xot.add_name_ns("object", premis),
            property: xot.add_name_ns("significantProperties", premis),
            property_type: xot.add_name_ns("significantPropertiesType", premis),
            property_value: xot.add_name_ns("significantPropertiesValue", premis),
        }
    }
}

/// A significant-properties document owned by one stage
pub struct SignificantProperties {
    xot: Xot,
    document: Node,
    names: Names,
    layout: SigPropLayout,
}

impl SignificantProperties {
    /// Parse a significant-properties document.
    pub fn parse(xml: &str, layout: &SigPropLayout) -> Result<Self> {
        let mut xot = Xot::new();
        let names = Names::register(&mut xot);
        let document = xot.parse(xml).map_err(Error::xml)?;
        Ok(Self {
            xot,
            document,
            names,
            layout: layout.clone(),
        })
    }

    /// The built-in template document.
    pub fn template(layout: &SigPropLayout) -> Result<Self> {
        Self::parse(TEMPLATE, layout)
    }

    /// Load the document at `path`.
    ///
    /// A missing file yields the template. So does a file that cannot be
    /// read or parsed or lacks the PREMIS object element; that case is noted
    /// as a warning in `log`.
    pub fn load(path: &Path, layout: &SigPropLayout, log: &mut Log) -> Result<Self> {
        if !path.is_file() {
            debug!("No significant properties at {}, using template", path.display());
            return Self::template(layout);
        }

        let xml = match fs::read_to_string(path) {
            Ok(xml) => xml,
            Err(e) => {
                log.warning(
                    origin::SIGNIFICANT_PROPERTIES,
                    format!(
                        "Unable to read '{}' ({}), starting from the template.",
                        path.display(),
                        e
                    ),
                );
                return Self::template(layout);
            }
        };
        match Self::parse(&xml, layout) {
            Ok(tree) if tree.object().is_some() => Ok(tree),
            Ok(_) => {
                log.warning(
                    origin::SIGNIFICANT_PROPERTIES,
                    format!(
                        "'{}' has no PREMIS object element, starting from the template.",
                        path.display()
                    ),
                );
                Self::template(layout)
            }
            Err(e) => {
                log.warning(
                    origin::SIGNIFICANT_PROPERTIES,
                    format!(
                        "Unable to parse '{}' ({}), starting from the template.",
                        path.display(),
                        e
                    ),
                );
                Self::template(layout)
            }
        }
    }

    /// Current properties, keyed by type.
    ///
    /// Properties lacking a type or value element, or with an empty type,
    /// are skipped. The first property of a type wins.
    pub fn view(&self) -> MetadataStore {
        let mut store = MetadataStore::new();
        let Some(object) = self.object() else {
            return store;
        };

        for property in self.properties(object) {
            let Some((type_node, value_node)) = self.parts(property) else {
                continue;
            };
            let property_type = self.text(type_node);
            if property_type.is_empty() || store.contains(&property_type) {
                continue;
            }
            store.insert(property_type, self.text(value_node).into());
        }
        store
    }

    /// Patch `store` into the document.
    ///
    /// Returns `false` without touching the tree if `store` is empty, in
    /// which case the document does not need to be written.
    pub fn merge(&mut self, store: &MetadataStore) -> Result<bool> {
        if store.is_empty() {
            return Ok(false);
        }

        let object = self.object().ok_or_else(|| Error::Xml {
            message: "document has no PREMIS object element".to_string(),
        })?;

        let mut handled: Vec<String> = Vec::new();
        for property in self.properties(object) {
            let Some((type_node, value_node)) = self.parts(property) else {
                continue;
            };
            let property_type = self.text(type_node);
            let Some(value) = store.get(&property_type) else {
                continue;
            };
            let value = value.first().unwrap_or_default().to_string();
            self.set_text(value_node, &value)?;
            handled.push(property_type);
        }

        let additions: Vec<(String, String)> = self
            .layout
            .types
            .iter()
            .filter(|t| !handled.contains(t))
            .filter_map(|t| {
                store
                    .get(t)
                    .map(|value| (t.clone(), value.first().unwrap_or_default().to_string()))
            })
            .collect();

        if !additions.is_empty() {
            debug!(
                "Appending significant properties: {:?}",
                additions.iter().map(|(t, _)| t).collect::<Vec<_>>()
            );
            self.append_properties(object, &additions)?;
        }

        Ok(true)
    }

    /// Serialize the document, terminated by a newline.
    pub fn to_xml_string(&self) -> Result<String> {
        let mut xml = self.xot.to_string(self.document).map_err(Error::xml)?;
        if !xml.ends_with('\n') {
            xml.push('\n');
        }
        Ok(xml)
    }

    /// Serialize the document to `path`, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_xml_string()?)?;
        Ok(())
    }

    fn object(&self) -> Option<Node> {
        let root = self
            .xot
            .children(self.document)
            .find(|&node| self.xot.is_element(node))?;
        self.child(root, self.names.object)
    }

    fn properties(&self, object: Node) -> Vec<Node> {
        self.xot
            .children(object)
            .filter(|&node| self.has_name(node, self.names.property))
            .collect()
    }

    fn parts(&self, property: Node) -> Option<(Node, Node)> {
        Some((
            self.child(property, self.names.property_type)?,
            self.child(property, self.names.property_value)?,
        ))
    }

    fn child(&self, parent: Node, name: NameId) -> Option<Node> {
        self.xot
            .children(parent)
            .find(|&node| self.has_name(node, name))
    }

    fn has_name(&self, node: Node, name: NameId) -> bool {
        self.xot
            .element(node)
            .is_some_and(|element| element.name() == name)
    }

    fn text(&self, node: Node) -> String {
        self.xot
            .children(node)
            .filter_map(|child| self.xot.text_str(child))
            .collect()
    }

    fn set_text(&mut self, node: Node, text: &str) -> Result<()> {
        let children: Vec<Node> = self.xot.children(node).collect();
        for child in children {
            self.xot.remove(child).map_err(Error::xml)?;
        }
        self.append_text(node, text)
    }

    fn append_text(&mut self, parent: Node, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let text = self.xot.new_text(text);
        self.xot.append(parent, text).map_err(Error::xml)
    }

    /// Number of element ancestors of `node`.
    fn depth(&self, node: Node) -> usize {
        let mut depth = 0;
        let mut current = self.xot.parent(node);
        while let Some(parent) = current {
            if self.xot.is_element(parent) {
                depth += 1;
            }
            current = self.xot.parent(parent);
        }
        depth
    }

    fn indentation(&self, depth: usize) -> String {
        format!("\n{}", self.layout.indent.repeat(depth))
    }

    /// Replace the whitespace following the last child of `parent` (or the
    /// whole content of a parent without non-text children) with `text`.
    fn replace_trailing_text(&mut self, parent: Node, text: &str) -> Result<()> {
        let children: Vec<Node> = self.xot.children(parent).collect();
        let keep = children
            .iter()
            .rposition(|&node| !self.xot.is_text(node))
            .map_or(0, |i| i + 1);
        for &node in &children[keep..] {
            self.xot.remove(node).map_err(Error::xml)?;
        }
        self.append_text(parent, text)
    }

    fn append_properties(&mut self, object: Node, additions: &[(String, String)]) -> Result<()> {
        let depth = self.depth(object);
        let child_indent = self.indentation(depth + 1);
        let closing_indent = self.indentation(depth);

        self.replace_trailing_text(object, &child_indent)?;

        for (i, (property_type, value)) in additions.iter().enumerate() {
            let property = self.new_property(property_type, value, depth + 1)?;
            self.xot.append(object, property).map_err(Error::xml)?;
            let tail = if i + 1 == additions.len() {
                &closing_indent
            } else {
                &child_indent
            };
            self.append_text(object, tail)?;
        }
        Ok(())
    }

    fn new_property(&mut self, property_type: &str, value: &str, depth: usize) -> Result<Node> {
        let inner_indent = self.indentation(depth + 1);
        let closing_indent = self.indentation(depth);

        let property = self.xot.new_element(self.names.property);
        let type_node = self.xot.new_element(self.names.property_type);
        let value_node = self.xot.new_element(self.names.property_value);
        self.append_text(type_node, property_type)?;
        self.append_text(value_node, value)?;

        self.append_text(property, &inner_indent)?;
        self.xot.append(property, type_node).map_err(Error::xml)?;
        self.append_text(property, &inner_indent)?;
        self.xot.append(property, value_node).map_err(Error::xml)?;
        self.append_text(property, &closing_indent)?;
        Ok(property)
    }
}
