use std::collections::HashMap;
use std::convert::TryFrom;
use std::iter::Peekable;
use std::str::{Chars, FromStr};

use crate::error::Error;

// https://www.w3.org/TR/rdf-canon/
// https://www.w3.org/TR/n-quads/#terminals

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
pub const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
pub const RDF_JSON: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#JSON";
pub const LANG_STRING_IRI_STR: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";

/// <https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-dataset>
#[derive(Debug, Clone, Default)]
pub struct DataSet {
    pub default_graph: Graph,
    pub named_graphs: HashMap<GraphLabel, Graph>,
}

/// <https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-graph>
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub triples: Vec<Triple>,
}

/// <https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-triple>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    pub subject: Subject,
    pub predicate: Predicate,
    pub object: Object,
}

/// Triple in a named or default graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub subject: Subject,
    pub predicate: Predicate,
    pub object: Object,
    pub graph_label: Option<GraphLabel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subject {
    IRIRef(IRIRef),
    BlankNodeLabel(BlankNodeLabel),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    IRIRef(IRIRef),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Object {
    IRIRef(IRIRef),
    BlankNodeLabel(BlankNodeLabel),
    Literal(Literal),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GraphLabel {
    IRIRef(IRIRef),
    BlankNodeLabel(BlankNodeLabel),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IRIRef(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlankNodeLabel(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IRIOrBlankNodeIdentifier {
    IRIRef(IRIRef),
    BlankNodeLabel(BlankNodeLabel),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    String { string: StringLiteral },
    Typed { string: StringLiteral, type_: IRIRef },
    LangTagged { string: StringLiteral, lang: Lang },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StringLiteral(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Lang(pub String);

impl From<&Statement> for String {
    fn from(statement: &Statement) -> String {
        String::from(&statement.subject)
            + " "
            + &String::from(&statement.predicate)
            + " "
            + &String::from(&statement.object)
            + &match &statement.graph_label {
                Some(graph_label) => " ".to_string() + &String::from(graph_label),
                None => "".to_string(),
            }
            + " .\n"
    }
}

impl From<&Subject> for String {
    fn from(subject: &Subject) -> String {
        match subject {
            Subject::IRIRef(iri_ref) => String::from(iri_ref),
            Subject::BlankNodeLabel(blank_node_label) => String::from(blank_node_label),
        }
    }
}

impl From<&Predicate> for String {
    fn from(predicate: &Predicate) -> String {
        match predicate {
            Predicate::IRIRef(iri_ref) => String::from(iri_ref),
        }
    }
}

impl From<&Object> for String {
    fn from(object: &Object) -> String {
        match object {
            Object::IRIRef(iri_ref) => String::from(iri_ref),
            Object::BlankNodeLabel(blank_node_label) => String::from(blank_node_label),
            Object::Literal(literal) => String::from(literal),
        }
    }
}

impl From<&GraphLabel> for String {
    fn from(graph_label: &GraphLabel) -> String {
        match graph_label {
            GraphLabel::IRIRef(iri_ref) => String::from(iri_ref),
            GraphLabel::BlankNodeLabel(blank_node_label) => String::from(blank_node_label),
        }
    }
}

impl From<&IRIRef> for String {
    fn from(iri_ref: &IRIRef) -> String {
        let string = &iri_ref.0;
        let mut out = String::with_capacity(string.len() + 2);
        out.push('<');
        for c in string.chars() {
            match c {
                '\x00'..='\x20' | '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' => {
                    let code: u32 = c.into();
                    out.push_str(&format!("\\u{:04X}", code))
                }
                _ => out.push(c),
            }
        }
        out.push('>');
        out
    }
}

impl From<&StringLiteral> for String {
    fn from(string_literal: &StringLiteral) -> String {
        let string = &string_literal.0;
        // estimate size of escaped string
        let mut out = String::with_capacity(string.len() + 6);
        out.push('"');
        for c in string.chars() {
            match c {
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                _ => out.push(c),
            }
        }
        out.push('"');
        out
    }
}

impl From<&BlankNodeLabel> for String {
    fn from(blank_node_label: &BlankNodeLabel) -> String {
        // Escaping not implemented, since we are constructing these
        blank_node_label.0.clone()
    }
}

fn parse_lang_subtag(chars: &mut Peekable<Chars>, string: &mut String) -> Result<(), Error> {
    let mut empty = true;
    while let Some(c) = chars.peek().copied() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' => {
                string.push(c);
                chars.next();
                empty = false;
            }
            _ => break,
        }
    }
    if empty {
        return Err(Error::ExpectedLang);
    }
    Ok(())
}

fn parse_lang(chars: &mut Peekable<Chars>) -> Result<Lang, Error> {
    let mut out = String::new();
    while let Some(c) = chars.peek().copied() {
        match c {
            'a'..='z' | 'A'..='Z' => {
                out.push(c);
                chars.next();
            }
            '-' if !out.is_empty() => {
                out.push(c);
                chars.next();
                parse_lang_subtag(chars, &mut out)?;
            }
            _ => return Err(Error::ExpectedLang),
        }
    }
    if out.is_empty() {
        return Err(Error::ExpectedLang);
    }
    Ok(Lang(out))
}

impl From<&Lang> for String {
    fn from(lang: &Lang) -> String {
        lang.0.clone()
    }
}

/// Language tag: `[a-zA-Z]+ ('-' [a-zA-Z0-9]+)*`
impl FromStr for Lang {
    type Err = Error;
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let mut chars = tag.chars().peekable();
        parse_lang(&mut chars)
    }
}

impl From<&Literal> for String {
    fn from(literal: &Literal) -> String {
        match literal {
            Literal::String { string } => String::from(string),
            Literal::Typed { string, type_ } => String::from(string) + "^^" + &String::from(type_),
            Literal::LangTagged { string, lang } => {
                String::from(string) + "@" + &String::from(lang)
            }
        }
    }
}

impl TryFrom<String> for IRIRef {
    type Error = Error;
    fn try_from(string: String) -> Result<Self, Self::Error> {
        iref::Iri::new(string.as_str()).map_err(|_| Error::InvalidIri(string.clone()))?;
        Ok(Self(string))
    }
}

impl TryFrom<String> for IRIOrBlankNodeIdentifier {
    type Error = Error;
    fn try_from(id: String) -> Result<Self, Self::Error> {
        if id.starts_with("_:") {
            return Ok(Self::BlankNodeLabel(BlankNodeLabel(id)));
        }
        if id.is_empty() {
            return Err(Error::ExpectedString);
        }
        Ok(Self::IRIRef(IRIRef::try_from(id)?))
    }
}

impl From<IRIOrBlankNodeIdentifier> for GraphLabel {
    fn from(graph_name: IRIOrBlankNodeIdentifier) -> Self {
        match graph_name {
            IRIOrBlankNodeIdentifier::BlankNodeLabel(id) => Self::BlankNodeLabel(id),
            IRIOrBlankNodeIdentifier::IRIRef(id) => Self::IRIRef(id),
        }
    }
}

impl From<IRIOrBlankNodeIdentifier> for Subject {
    fn from(subject: IRIOrBlankNodeIdentifier) -> Self {
        match subject {
            IRIOrBlankNodeIdentifier::BlankNodeLabel(id) => Self::BlankNodeLabel(id),
            IRIOrBlankNodeIdentifier::IRIRef(id) => Self::IRIRef(id),
        }
    }
}

impl From<IRIOrBlankNodeIdentifier> for Object {
    fn from(object: IRIOrBlankNodeIdentifier) -> Self {
        match object {
            IRIOrBlankNodeIdentifier::BlankNodeLabel(id) => Self::BlankNodeLabel(id),
            IRIOrBlankNodeIdentifier::IRIRef(id) => Self::IRIRef(id),
        }
    }
}

impl TryFrom<IRIOrBlankNodeIdentifier> for Predicate {
    type Error = Error;
    fn try_from(id: IRIOrBlankNodeIdentifier) -> Result<Self, Self::Error> {
        match id {
            IRIOrBlankNodeIdentifier::BlankNodeLabel(_) => Err(Error::UnsupportedBlankPredicate),
            IRIOrBlankNodeIdentifier::IRIRef(id) => Ok(Self::IRIRef(id)),
        }
    }
}

impl Statement {
    pub fn blank_node_components(&self) -> Vec<&BlankNodeLabel> {
        self.blank_node_components_with_position()
            .into_iter()
            .map(|(label, _position)| label)
            .collect()
    }

    pub fn blank_node_components_mut(&mut self) -> Vec<&mut BlankNodeLabel> {
        let mut labels: Vec<&mut BlankNodeLabel> = Vec::new();
        if let Subject::BlankNodeLabel(ref mut label) = self.subject {
            labels.push(label)
        }
        if let Object::BlankNodeLabel(ref mut label) = self.object {
            labels.push(label)
        }
        if let Some(GraphLabel::BlankNodeLabel(ref mut label)) = self.graph_label {
            labels.push(label)
        }
        labels
    }

    pub fn blank_node_components_with_position(&self) -> Vec<(&BlankNodeLabel, char)> {
        let mut labels = Vec::new();
        if let Subject::BlankNodeLabel(ref label) = self.subject {
            labels.push((label, 's'))
        }
        if let Object::BlankNodeLabel(ref label) = self.object {
            labels.push((label, 'o'))
        }
        if let Some(GraphLabel::BlankNodeLabel(ref label)) = self.graph_label {
            labels.push((label, 'g'))
        }
        labels
    }
}

impl Graph {
    pub fn add(&mut self, triple: Triple) {
        self.triples.push(triple);
    }
}

impl DataSet {
    pub fn statements(&self) -> Vec<Statement> {
        let default_graph = self.default_graph.triples.iter().map(|triple| (None, triple));
        let named_graphs = self.named_graphs.iter().flat_map(|(label, graph)| {
            graph
                .triples
                .iter()
                .map(move |triple| (Some(label.clone()), triple))
        });
        default_graph
            .chain(named_graphs)
            .map(|(graph_label, triple)| Statement {
                subject: triple.subject.clone(),
                predicate: triple.predicate.clone(),
                object: triple.object.clone(),
                graph_label,
            })
            .collect()
    }

    pub fn add_statement(&mut self, statement: Statement) {
        let graph = match statement.graph_label {
            Some(label) => self.named_graphs.entry(label).or_default(),
            None => &mut self.default_graph,
        };
        graph.add(Triple {
            subject: statement.subject,
            predicate: statement.predicate,
            object: statement.object,
        });
    }

    /// Serialize as N-Quads, one statement per line, lines sorted and
    /// duplicates removed.
    pub fn to_nquads(&self) -> String {
        let mut lines = self
            .statements()
            .iter()
            .map(String::from)
            .collect::<Vec<String>>();
        lines.sort();
        lines.dedup();
        lines.join("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape() {
        let string_literal = StringLiteral("\t\x08\n\r\x0c\"\'\\\u{221e}".to_string());
        assert_eq!(
            String::from(&string_literal),
            "\"\t\x08\\n\\r\x0c\\\"'\\\\\u{221e}\""
        );

        let iri_ref = IRIRef("urn:ex:s".to_string());
        assert_eq!(String::from(&iri_ref), "<urn:ex:s>");
        let iri_ref = IRIRef("urn:ex:a b".to_string());
        assert_eq!(String::from(&iri_ref), "<urn:ex:a\\u0020b>");
    }

    #[test]
    fn line() {
        let statement = Statement {
            subject: Subject::BlankNodeLabel(BlankNodeLabel("_:c14n0".to_string())),
            predicate: Predicate::IRIRef(IRIRef(RDF_TYPE.to_string())),
            object: Object::IRIRef(IRIRef("http://example.org/vocab#Foo".to_string())),
            graph_label: None,
        };
        assert_eq!(String::from(&statement), "_:c14n0 <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://example.org/vocab#Foo> .\n");
    }

    #[test]
    fn lang_tags() {
        assert_eq!(Lang::from_str("en").unwrap(), Lang("en".to_string()));
        assert_eq!(Lang::from_str("en-US").unwrap(), Lang("en-US".to_string()));
        assert!(Lang::from_str("").is_err());
        assert!(Lang::from_str("en-").is_err());
        assert!(Lang::from_str("e n").is_err());
    }

    #[test]
    fn nquads_sorted_and_deduplicated() {
        let mut dataset = DataSet::default();
        let statement = |s: &str, o: &str| Statement {
            subject: Subject::IRIRef(IRIRef(s.to_string())),
            predicate: Predicate::IRIRef(IRIRef("urn:ex:p".to_string())),
            object: Object::Literal(Literal::String {
                string: StringLiteral(o.to_string()),
            }),
            graph_label: None,
        };
        dataset.add_statement(statement("urn:ex:b", "2"));
        dataset.add_statement(statement("urn:ex:a", "1"));
        dataset.add_statement(statement("urn:ex:a", "1"));
        assert_eq!(
            dataset.to_nquads(),
            "<urn:ex:a> <urn:ex:p> \"1\" .\n<urn:ex:b> <urn:ex:p> \"2\" .\n"
        );
    }
}
