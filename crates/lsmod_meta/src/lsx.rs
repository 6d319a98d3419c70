//! Parsing of the structured `meta.lsx` document.
//!
//! The document is a tree of `<node id="...">` elements carrying
//! `<attribute id="..." type="..." value="..."/>` leaves. Container elements
//! (`save`, `region`, `children`, `version`) carry no data and are skipped.
//!
//! ```xml
//! <save>
//!   <region id="Config">
//!     <node id="root">
//!       <children>
//!         <node id="Dependencies">
//!           <children>
//!             <node id="ModuleShortDesc">
//!               <attribute id="UUID" type="FixedString" value="..."/>
//!             </node>
//!           </children>
//!         </node>
//!         <node id="ModuleInfo">
//!           <attribute id="UUID" type="FixedString" value="..."/>
//!           <attribute id="Name" type="LSString" value="Alpha"/>
//!         </node>
//!       </children>
//!     </node>
//!   </region>
//! </save>
//! ```

use crate::{error::Result, DependencyRef, MetadataError, Version64};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

pub const MODULE_NODE: &str = "ModuleInfo";
pub const DEPENDENCIES_NODE: &str = "Dependencies";
pub const CONFLICTS_NODE: &str = "Conflicts";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LsxAttribute {
    pub id: String,
    pub type_name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LsxNode {
    pub id: String,
    pub attributes: Vec<LsxAttribute>,
    pub children: Vec<LsxNode>,
}

impl LsxNode {
    pub fn attribute(&self, id: &str) -> Option<&LsxAttribute> {
        self.attributes.iter().find(|a| a.id == id)
    }

    /// Trimmed attribute value, `None` when absent or blank.
    pub fn value(&self, id: &str) -> Option<&str> {
        self.attribute(id)
            .map(|a| a.value.trim())
            .filter(|v| !v.is_empty())
    }

    /// Depth-first search, this node included.
    pub fn find(&self, id: &str) -> Option<&LsxNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// The node's version: `Version64` if present, else the legacy `Version`.
    pub fn version(&self) -> Option<Version64> {
        if let Some(value) = self.value("Version64") {
            return parse_packed64(value);
        }
        let attribute = self.attribute("Version")?;
        let value = attribute.value.trim();
        if attribute.type_name.contains("64") {
            parse_packed64(value)
        } else {
            value
                .parse::<u32>()
                .ok()
                .or_else(|| value.parse::<i32>().ok().map(|v| v as u32))
                .map(Version64::from_packed32)
        }
    }
}

fn parse_packed64(value: &str) -> Option<Version64> {
    value
        .parse::<u64>()
        .ok()
        .or_else(|| value.parse::<i64>().ok().map(|v| v as u64))
        .map(Version64::from_packed)
}

/// The module description extracted from a `meta.lsx` document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleInfo {
    pub uuid: String,
    pub folder: String,
    pub name: String,
    pub author: String,
    pub description: String,
    pub version: Version64,
    pub md5: Option<String>,
    pub tags: Vec<String>,
    pub dependencies: Vec<DependencyRef>,
    pub conflicts: Vec<DependencyRef>,
}

/// Parse raw document bytes. A leading byte order mark is ignored.
pub fn parse_module_info(bytes: &[u8]) -> Result<ModuleInfo> {
    let text = std::str::from_utf8(bytes).map_err(|_| MetadataError::Encoding)?;
    let root = parse_tree(text.trim_start_matches('\u{feff}'))?;
    module_info_from_tree(&root)
}

/// Parse the document into a node tree under an unnamed root.
pub fn parse_tree(text: &str) -> Result<LsxNode> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack = vec![LsxNode::default()];
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"node" => {
                stack.push(node_from_element(&e)?);
            }
            Event::Empty(e) if e.name().as_ref() == b"node" => {
                let node = node_from_element(&e)?;
                push_child(&mut stack, node)?;
            }
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"attribute" => {
                let attribute = attribute_from_element(&e)?;
                current(&mut stack)?.attributes.push(attribute);
            }
            Event::End(e) if e.name().as_ref() == b"node" => {
                if stack.len() < 2 {
                    return Err(MetadataError::Malformed(
                        "closing node without an open node".to_string(),
                    ));
                }
                if let Some(node) = stack.pop() {
                    push_child(&mut stack, node)?;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(MetadataError::Malformed(format!(
            "{} node(s) not closed",
            stack.len() - 1
        )));
    }
    stack
        .pop()
        .ok_or_else(|| MetadataError::Malformed("empty document".to_string()))
}

/// Extract the module description from a parsed tree.
pub fn module_info_from_tree(root: &LsxNode) -> Result<ModuleInfo> {
    let module = root.find(MODULE_NODE).ok_or(MetadataError::MissingIdentity)?;
    let uuid = module.value("UUID").ok_or(MetadataError::MissingIdentity)?;

    let tags = module
        .value("Tags")
        .map(|tags| {
            let mut unique: Vec<String> = Vec::new();
            for tag in tags.split(';').map(str::trim).filter(|t| !t.is_empty()) {
                if !unique.iter().any(|t| t == tag) {
                    unique.push(tag.to_string());
                }
            }
            unique
        })
        .unwrap_or_default();

    Ok(ModuleInfo {
        uuid: uuid.to_string(),
        folder: module.value("Folder").unwrap_or_default().to_string(),
        name: module.value("Name").unwrap_or_default().to_string(),
        author: module.value("Author").unwrap_or_default().to_string(),
        description: module.value("Description").unwrap_or_default().to_string(),
        version: module.version().unwrap_or_default(),
        md5: module.value("MD5").map(str::to_string),
        tags,
        dependencies: reference_list(root, DEPENDENCIES_NODE),
        conflicts: reference_list(root, CONFLICTS_NODE),
    })
}

fn reference_list(root: &LsxNode, list_id: &str) -> Vec<DependencyRef> {
    let Some(list) = root.find(list_id) else {
        return Vec::new();
    };

    list.children
        .iter()
        .filter_map(|item| {
            let Some(id) = item.value("UUID") else {
                tracing::debug!("Skipping {} item without a UUID", list_id);
                return None;
            };
            Some(DependencyRef {
                id: id.to_string(),
                folder: item.value("Folder").unwrap_or_default().to_string(),
                name: item.value("Name").unwrap_or_default().to_string(),
                version: item.version().unwrap_or_default(),
                content_hash: item.value("MD5").map(str::to_string),
            })
        })
        .collect()
}

fn current(stack: &mut [LsxNode]) -> Result<&mut LsxNode> {
    stack
        .last_mut()
        .ok_or_else(|| MetadataError::Malformed("element outside the document".to_string()))
}

fn push_child(stack: &mut [LsxNode], node: LsxNode) -> Result<()> {
    current(stack)?.children.push(node);
    Ok(())
}

fn node_from_element(element: &BytesStart<'_>) -> Result<LsxNode> {
    let mut node = LsxNode::default();
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == b"id" {
            node.id = attr.unescape_value()?.into_owned();
        }
    }
    Ok(node)
}

fn attribute_from_element(element: &BytesStart<'_>) -> Result<LsxAttribute> {
    let mut attribute = LsxAttribute {
        id: String::new(),
        type_name: String::new(),
        value: String::new(),
    };
    for attr in element.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?.into_owned();
        match attr.key.as_ref() {
            b"id" => attribute.id = value,
            b"type" => attribute.type_name = value,
            b"value" => attribute.value = value,
            _ => {}
        }
    }
    Ok(attribute)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn alpha_document() -> String {
        let version = Version64::new(1, 2, 3, 4).to_packed();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<save>
  <version major="4" minor="0" revision="9" build="331"/>
  <region id="Config">
    <node id="root">
      <children>
        <node id="Dependencies">
          <children>
            <node id="ModuleShortDesc">
              <attribute id="Folder" type="LSString" value="Beta"/>
              <attribute id="MD5" type="LSString" value=""/>
              <attribute id="Name" type="LSString" value="Beta"/>
              <attribute id="UUID" type="FixedString" value="22222222-2222-2222-2222-222222222222"/>
              <attribute id="Version64" type="int64" value="36028797018963968"/>
            </node>
          </children>
        </node>
        <node id="ModuleInfo">
          <attribute id="Author" type="LSString" value="Someone"/>
          <attribute id="Description" type="LSString" value="Adds &amp; tweaks things"/>
          <attribute id="Folder" type="LSString" value="Alpha"/>
          <attribute id="Name" type="LSString" value="Alpha"/>
          <attribute id="Tags" type="LSString" value="Spells;Classes;Spells"/>
          <attribute id="UUID" type="FixedString" value="11111111-1111-1111-1111-111111111111"/>
          <attribute id="Version64" type="int64" value="{version}"/>
          <children>
            <node id="PublishVersion">
              <attribute id="Version64" type="int64" value="1"/>
            </node>
          </children>
        </node>
      </children>
    </node>
  </region>
</save>"#
        )
    }

    #[test]
    fn test_parse_module_info() {
        let info = parse_module_info(alpha_document().as_bytes()).unwrap();

        assert_eq!(info.uuid, "11111111-1111-1111-1111-111111111111");
        assert_eq!(info.name, "Alpha");
        assert_eq!(info.author, "Someone");
        assert_eq!(info.description, "Adds & tweaks things");
        assert_eq!(info.version, Version64::new(1, 2, 3, 4));
        assert_eq!(info.tags, vec!["Spells", "Classes"]);
        assert!(info.md5.is_none());
        assert!(info.conflicts.is_empty());

        assert_eq!(info.dependencies.len(), 1);
        let beta = &info.dependencies[0];
        assert_eq!(beta.id, "22222222-2222-2222-2222-222222222222");
        assert_eq!(beta.folder, "Beta");
        assert_eq!(beta.version, Version64::new(1, 0, 0, 0));
        assert!(beta.content_hash.is_none());
    }

    #[test]
    fn test_missing_lists_are_empty() {
        let doc = r#"<save><region id="Config"><node id="root"><children>
            <node id="ModuleInfo">
              <attribute id="UUID" type="FixedString" value="abc"/>
            </node>
        </children></node></region></save>"#;
        let info = parse_module_info(doc.as_bytes()).unwrap();
        assert_eq!(info.uuid, "abc");
        assert!(info.dependencies.is_empty());
        assert!(info.conflicts.is_empty());
        assert!(info.version.is_zero());
    }

    #[test]
    fn test_missing_identity() {
        let no_module = r#"<save><region id="Config"><node id="root"/></region></save>"#;
        assert!(matches!(
            parse_module_info(no_module.as_bytes()),
            Err(MetadataError::MissingIdentity)
        ));

        let no_uuid = r#"<save><node id="ModuleInfo">
            <attribute id="Name" type="LSString" value="Nameless"/>
            <attribute id="UUID" type="FixedString" value="  "/>
        </node></save>"#;
        assert!(matches!(
            parse_module_info(no_uuid.as_bytes()),
            Err(MetadataError::MissingIdentity)
        ));
    }

    #[test]
    fn test_conflicts_and_items_without_uuid() {
        let doc = r#"<save><node id="root"><children>
            <node id="Conflicts"><children>
              <node id="ModuleShortDesc">
                <attribute id="UUID" type="FixedString" value="c1"/>
                <attribute id="Name" type="LSString" value="Rival"/>
              </node>
              <node id="ModuleShortDesc">
                <attribute id="Name" type="LSString" value="No id"/>
              </node>
            </children></node>
            <node id="ModuleInfo"><attribute id="UUID" type="FixedString" value="m"/></node>
        </children></node></save>"#;
        let info = parse_module_info(doc.as_bytes()).unwrap();
        assert_eq!(info.conflicts.len(), 1);
        assert_eq!(info.conflicts[0].name, "Rival");
    }

    #[test]
    fn test_legacy_version_attribute() {
        let packed32 = (2u32 << 28) | (1 << 24);
        let doc = format!(
            r#"<save><node id="ModuleInfo">
                <attribute id="UUID" type="FixedString" value="m"/>
                <attribute id="Version" type="int32" value="{packed32}"/>
            </node></save>"#
        );
        let info = parse_module_info(doc.as_bytes()).unwrap();
        assert_eq!(info.version, Version64::new(2, 1, 0, 0));
    }

    #[test]
    fn test_malformed_documents() {
        let mismatched = r#"<save><node id="ModuleInfo"></save>"#;
        assert!(parse_module_info(mismatched.as_bytes()).is_err());

        let unclosed = r#"<node id="ModuleInfo"><attribute id="UUID" value="m"/>"#;
        assert!(matches!(
            parse_module_info(unclosed.as_bytes()),
            Err(MetadataError::Malformed(_) | MetadataError::Xml(_))
        ));

        assert!(matches!(
            parse_module_info(&[0xff, 0xfe, 0x00]),
            Err(MetadataError::Encoding)
        ));
    }

    #[test]
    fn test_byte_order_mark_is_ignored() {
        let doc = format!("\u{feff}{}", alpha_document());
        assert!(parse_module_info(doc.as_bytes()).is_ok());
    }
}
