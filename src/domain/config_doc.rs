//! Job configuration documents and the SCM branch specifier inside them.
//!
//! The document is kept as raw text. Parsing is only used to *locate* the
//! branch value; rewriting is a literal text substitution so every other byte
//! (comments, attribute order, whitespace) survives untouched.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::domain::error::DomainError;

/// Element chains probed for the branch specifier, in order.
///
/// Pipeline jobs nest the SCM under `definition`, freestyle jobs do not.
pub const BRANCH_PATHS: [&str; 2] = [
    "definition/scm/branches/hudson.plugins.git.BranchSpec/name",
    "scm/branches/hudson.plugins.git.BranchSpec/name",
];

/// Prefix Jenkins uses to match a branch on any remote.
pub const WILDCARD_PREFIX: &str = "*/";

/// Raw `config.xml` of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDocument {
    raw: String,
}

/// Result of computing a branch rewrite. Only `Changed` needs a write-back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchRewrite {
    /// No branch specifier under any known path.
    NotFound,
    /// Substitution left the document byte-identical; `branch` is the current value.
    Unchanged { branch: String },
    /// Every occurrence of `old` was replaced by `new`.
    Changed {
        old: String,
        new: String,
        occurrences: usize,
        document: ConfigDocument,
    },
}

impl ConfigDocument {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Current branch specifier, or `None` when no known path resolves.
    pub fn branch(&self) -> Result<Option<String>, DomainError> {
        let root = Element::parse(&self.raw)?;
        Ok(BRANCH_PATHS
            .iter()
            .filter_map(|path| root.find_path(path))
            .map(|node| node.text.clone())
            .find(|text| !text.trim().is_empty()))
    }

    /// Compute the document with the branch replaced by `new_branch`.
    ///
    /// The replacement is global: if the old value also appears in unrelated
    /// fields (a description, another SCM block) those occurrences change too.
    pub fn rewrite_branch(&self, new_branch: &str) -> Result<BranchRewrite, DomainError> {
        let Some(old) = self.branch()? else {
            return Ok(BranchRewrite::NotFound);
        };
        let new = normalize_branch(new_branch);

        let occurrences = self.raw.matches(old.as_str()).count();
        let replaced = self.raw.replace(old.as_str(), &new);
        if replaced == self.raw {
            return Ok(BranchRewrite::Unchanged { branch: old });
        }

        Ok(BranchRewrite::Changed {
            old,
            new,
            occurrences,
            document: ConfigDocument::new(replaced),
        })
    }
}

/// Prefix a branch name with `*/` unless it already carries it.
pub fn normalize_branch(name: &str) -> String {
    if name.starts_with(WILDCARD_PREFIX) {
        name.to_string()
    } else {
        format!("{WILDCARD_PREFIX}{name}")
    }
}

/// Minimal element tree, just enough to walk child chains.
#[derive(Debug, Default)]
struct Element {
    name: String,
    /// Text before the first child element.
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn parse(xml: &str) -> Result<Element, DomainError> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| malformed(format!("at byte {}: {e}", reader.buffer_position())))?;
            match event {
                Event::Start(start) => {
                    stack.push(Element {
                        name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
                        ..Element::default()
                    });
                }
                Event::Empty(start) => {
                    let element = Element {
                        name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
                        ..Element::default()
                    };
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| malformed("unbalanced closing tag".to_string()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| malformed(e.to_string()))?;
                    append_text(&mut stack, &text);
                }
                Event::CData(data) => {
                    let data = data.into_inner();
                    append_text(&mut stack, &String::from_utf8_lossy(&data));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(malformed("unexpected end of document".to_string()));
        }
        root.ok_or_else(|| malformed("document has no root element".to_string()))
    }

    /// First direct child with the given name.
    fn find(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Follow a `/`-separated chain of child names from this element.
    fn find_path(&self, path: &str) -> Option<&Element> {
        path.split('/')
            .try_fold(self, |node, segment| node.find(segment))
    }
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), DomainError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(malformed("more than one root element".to_string())),
    }
    Ok(())
}

fn append_text(stack: &mut [Element], text: &str) {
    if let Some(current) = stack.last_mut() {
        if current.children.is_empty() {
            current.text.push_str(text);
        }
    }
}

fn malformed(message: String) -> DomainError {
    DomainError::MalformedConfig(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const PIPELINE: &str = r#"<?xml version='1.1' encoding='UTF-8'?>
<flow-definition plugin="workflow-job@2.40">
  <description>Deploys the service</description>
  <definition class="org.jenkinsci.plugins.workflow.cps.CpsScmFlowDefinition">
    <scm class="hudson.plugins.git.GitSCM" plugin="git@4.7.1">
      <branches>
        <hudson.plugins.git.BranchSpec>
          <name>*/main</name>
        </hudson.plugins.git.BranchSpec>
      </branches>
    </scm>
    <scriptPath>Jenkinsfile</scriptPath>
  </definition>
</flow-definition>
"#;

    const FREESTYLE: &str = r#"<project>
  <!-- keep this comment -->
  <scm class="hudson.plugins.git.GitSCM">
    <branches>
      <hudson.plugins.git.BranchSpec><name>*/release</name></hudson.plugins.git.BranchSpec>
    </branches>
  </scm>
  <builders/>
</project>"#;

    #[test]
    fn given_pipeline_job_when_reading_branch_then_finds_definition_path() {
        let doc = ConfigDocument::new(PIPELINE);
        assert_eq!(doc.branch().unwrap(), Some("*/main".to_string()));
    }

    #[test]
    fn given_freestyle_job_when_reading_branch_then_finds_scm_path() {
        let doc = ConfigDocument::new(FREESTYLE);
        assert_eq!(doc.branch().unwrap(), Some("*/release".to_string()));
    }

    #[test]
    fn given_repeated_reads_when_reading_branch_then_same_value() {
        let doc = ConfigDocument::new(PIPELINE);
        assert_eq!(doc.branch().unwrap(), doc.branch().unwrap());
    }

    #[test]
    fn given_no_scm_when_reading_branch_then_none() {
        let doc = ConfigDocument::new("<project><builders/></project>");
        assert_eq!(doc.branch().unwrap(), None);
    }

    #[test]
    fn given_empty_name_when_reading_branch_then_falls_through_to_next_path() {
        let xml = r#"<flow-definition>
  <definition><scm><branches><hudson.plugins.git.BranchSpec><name></name></hudson.plugins.git.BranchSpec></branches></scm></definition>
  <scm><branches><hudson.plugins.git.BranchSpec><name>*/fallback</name></hudson.plugins.git.BranchSpec></branches></scm>
</flow-definition>"#;
        let doc = ConfigDocument::new(xml);
        assert_eq!(doc.branch().unwrap(), Some("*/fallback".to_string()));
    }

    #[test]
    fn given_two_branch_specs_when_reading_branch_then_first_wins() {
        let xml = r#"<project><scm><branches>
<hudson.plugins.git.BranchSpec><name>*/first</name></hudson.plugins.git.BranchSpec>
<hudson.plugins.git.BranchSpec><name>*/second</name></hudson.plugins.git.BranchSpec>
</branches></scm></project>"#;
        let doc = ConfigDocument::new(xml);
        assert_eq!(doc.branch().unwrap(), Some("*/first".to_string()));
    }

    #[test]
    fn given_nested_deeper_match_when_reading_branch_then_only_direct_children_count() {
        let xml = r#"<project><wrapper><scm><branches><hudson.plugins.git.BranchSpec><name>*/x</name></hudson.plugins.git.BranchSpec></branches></scm></wrapper></project>"#;
        let doc = ConfigDocument::new(xml);
        assert_eq!(doc.branch().unwrap(), None);
    }

    #[test]
    fn given_truncated_document_when_reading_branch_then_malformed() {
        let doc = ConfigDocument::new("<project><scm>");
        assert!(matches!(
            doc.branch(),
            Err(DomainError::MalformedConfig(_))
        ));
    }

    #[rstest]
    #[case("develop", "*/develop")]
    #[case("feature/xyz", "*/feature/xyz")]
    #[case("*/main", "*/main")]
    #[case("origin/main", "*/origin/main")]
    fn given_branch_name_when_normalizing_then_prefix_applied_once(
        #[case] input: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(normalize_branch(input), expected);
    }

    #[test]
    fn given_main_when_rewriting_to_develop_then_document_changes_only_there() {
        let doc = ConfigDocument::new(PIPELINE);
        let BranchRewrite::Changed {
            old,
            new,
            occurrences,
            document,
        } = doc.rewrite_branch("develop").unwrap()
        else {
            panic!("expected a change");
        };
        assert_eq!(old, "*/main");
        assert_eq!(new, "*/develop");
        assert_eq!(occurrences, 1);
        assert!(document.as_str().contains("<name>*/develop</name>"));
        assert_eq!(document.as_str(), PIPELINE.replace("*/main", "*/develop"));
    }

    #[test]
    fn given_comment_in_document_when_rewriting_then_formatting_preserved() {
        let doc = ConfigDocument::new(FREESTYLE);
        let BranchRewrite::Changed { document, .. } = doc.rewrite_branch("hotfix").unwrap() else {
            panic!("expected a change");
        };
        assert!(document.as_str().contains("<!-- keep this comment -->"));
        assert!(document.as_str().contains("<builders/>"));
    }

    #[test]
    fn given_old_value_in_description_when_rewriting_then_all_occurrences_replaced() {
        let xml = r#"<project>
  <description>Builds */main nightly</description>
  <scm><branches><hudson.plugins.git.BranchSpec><name>*/main</name></hudson.plugins.git.BranchSpec></branches></scm>
</project>"#;
        let doc = ConfigDocument::new(xml);
        let BranchRewrite::Changed {
            occurrences,
            document,
            ..
        } = doc.rewrite_branch("develop").unwrap()
        else {
            panic!("expected a change");
        };
        assert_eq!(occurrences, 2);
        assert!(document.as_str().contains("Builds */develop nightly"));
        assert!(!document.as_str().contains("*/main"));
    }

    #[test]
    fn given_same_branch_when_rewriting_then_unchanged() {
        let doc = ConfigDocument::new(PIPELINE);
        assert_eq!(
            doc.rewrite_branch("main").unwrap(),
            BranchRewrite::Unchanged {
                branch: "*/main".to_string()
            }
        );
    }

    #[test]
    fn given_escaped_value_when_rewriting_then_unchanged_because_not_verbatim() {
        let xml = "<project><scm><branches><hudson.plugins.git.BranchSpec><name>*/a&amp;b</name></hudson.plugins.git.BranchSpec></branches></scm></project>";
        let doc = ConfigDocument::new(xml);
        assert_eq!(doc.branch().unwrap(), Some("*/a&b".to_string()));
        assert!(matches!(
            doc.rewrite_branch("c").unwrap(),
            BranchRewrite::Unchanged { .. }
        ));
    }

    #[test]
    fn given_no_branch_when_rewriting_then_not_found() {
        let doc = ConfigDocument::new("<project/>");
        assert_eq!(doc.rewrite_branch("develop").unwrap(), BranchRewrite::NotFound);
    }
}
