//! Header declaration parser
//!
//! A recursive-descent walk over lexer tokens. It recognizes the parts of
//! C++ a class diagram needs (namespaces, classes, members, enums) and
//! skips everything else one balanced statement at a time.

use std::fs;
use std::path::Path;

use tracing::{debug, span, trace, Level};

use super::ast::{
    ClassDecl, EnumDecl, EnumValueDecl, InheritDecl, MethodDecl, ParamDecl, ParentRef,
    ParsedHeader, VariableDecl,
};
use super::lexer::{tokenize, Spanned, Token};
use crate::core::{normalize_type, ContainerKind, DiagramError, Result, Scope};

/// Declaration specifiers that never belong to a type string
const SPECIFIERS: &[&str] = &[
    "inline",
    "explicit",
    "constexpr",
    "consteval",
    "constinit",
    "extern",
    "mutable",
    "register",
    "thread_local",
    "__inline",
    "__forceinline",
];

/// Type keywords that cannot be a parameter name
const BUILTIN_TYPES: &[&str] = &[
    "void", "bool", "char", "wchar_t", "char8_t", "char16_t", "char32_t", "short", "int", "long",
    "float", "double", "signed", "unsigned", "auto",
];

/// Words that may precede a type but never name a declarator
const TYPE_QUALIFIERS: &[&str] = &[
    "const", "volatile", "struct", "class", "union", "enum", "typename",
];

/// Keywords that end a run of trailing declarators
const DECLARATION_KEYWORDS: &[&str] = &[
    "class", "struct", "union", "enum", "namespace", "template", "typedef", "using", "public",
    "private", "protected", "friend", "static", "virtual",
];

/// How the header text is handed to the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// The input is a path to read
    File,
    /// The input is header source text
    Text,
}

/// C++ header parser
#[derive(Debug, Clone, Copy)]
pub struct HeaderParser;

impl HeaderParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a file path or source text, depending on `kind`
    pub fn parse(&self, input: &str, kind: SourceKind) -> Result<ParsedHeader> {
        match kind {
            SourceKind::File => self.parse_file(input),
            SourceKind::Text => self.parse_str(input),
        }
    }

    /// Read and parse a header file
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<ParsedHeader> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        debug!(path = %path.display(), bytes = text.len(), "Read header file");
        self.parse_str(&text)
    }

    /// Parse header source text
    pub fn parse_str(&self, source: &str) -> Result<ParsedHeader> {
        let parse_span = span!(Level::DEBUG, "parse_header", input_len = source.len());
        let _enter = parse_span.enter();

        let tokens = tokenize(source)?;
        trace!(token_count = tokens.len(), "Tokenized header");

        let mut cursor = DeclParser::new(source, tokens);
        cursor.parse_namespace_body(&Context::default(), false)?;

        let header = cursor.header;
        debug!(
            classes = header.classes.len(),
            enums = header.enums.len(),
            "Parsed header"
        );
        Ok(header)
    }
}

impl Default for HeaderParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Lexical position: enclosing namespaces and, inside a class, that class
#[derive(Debug, Clone, Default)]
struct Context {
    namespaces: Vec<String>,
    enclosing: Option<ParentRef>,
}

impl Context {
    /// Raw scope string: namespaces, then the enclosing type
    fn namespace(&self) -> String {
        let mut parts: Vec<&str> = self
            .namespaces
            .iter()
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .collect();
        if let Some(parent) = &self.enclosing {
            parts.push(&parent.name);
        }
        parts.join("::")
    }

    fn qualify(&self, name: &str) -> String {
        match &self.enclosing {
            Some(parent) => format!("{}::{}", parent.name, name),
            None => name.to_string(),
        }
    }

    fn nested_in(&self, parent: ParentRef) -> Context {
        Context {
            namespaces: self.namespaces.clone(),
            enclosing: Some(parent),
        }
    }
}

/// Outcome of an attempt to read a type definition
enum Parsed<T> {
    Definition(T),
    Forward,
    /// The keyword starts a declaration that merely uses the type; the
    /// cursor is left where it was
    Usage,
}

/// Where a class definition appears
struct ClassSite<'d> {
    template: Option<String>,
    /// Class whose body contains the definition, with the current access
    owner: Option<(&'d mut ClassDecl, Scope)>,
    /// Definition follows `typedef`; an anonymous type takes the alias name
    typedef: bool,
}

impl ClassSite<'_> {
    fn top_level(template: Option<String>) -> Self {
        Self {
            template,
            owner: None,
            typedef: false,
        }
    }
}

/// A declarator trailing a type definition: `} name[4], *other;`
struct Declarator {
    name: String,
    prefix: Vec<Token>,
    is_array: bool,
}

struct DeclParser<'a> {
    source: &'a str,
    tokens: Vec<Spanned<Token>>,
    pos: usize,
    anon_count: usize,
    header: ParsedHeader,
}

impl<'a> DeclParser<'a> {
    fn new(source: &'a str, tokens: Vec<Spanned<Token>>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            anon_count: 0,
            header: ParsedHeader::default(),
        }
    }

    // ----------------------------------------------------------------
    // Cursor helpers
    // ----------------------------------------------------------------

    fn peek(&self) -> Option<&Token> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|(tok, _)| tok)
    }

    fn at_punct(&self, p: &str) -> bool {
        self.peek().map_or(false, |t| t.is_punct(p))
    }

    fn at_ident(&self, word: &str) -> bool {
        self.peek().map_or(false, |t| t.is_ident(word))
    }

    fn eat_punct(&mut self, p: &str) -> bool {
        if self.at_punct(p) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_ident(&mut self, word: &str) -> bool {
        if self.at_ident(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn at_class_key(&self) -> bool {
        self.at_ident("class") || self.at_ident("struct") || self.at_ident("union")
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.source.len(), |(_, span)| span.start)
    }

    fn error(&self, message: impl Into<String>) -> DiagramError {
        DiagramError::parse_error_at(message, self.source, self.offset())
    }

    fn expect_punct(&mut self, p: &str) -> Result<()> {
        if self.eat_punct(p) {
            return Ok(());
        }
        let found = self
            .peek()
            .map_or_else(|| "end of input".to_string(), |t| format!("'{}'", t.text()));
        Err(self.error(format!("expected '{}', found {}", p, found)))
    }

    fn tokens_since(&self, start: usize) -> impl Iterator<Item = Token> + '_ {
        self.tokens[start..self.pos].iter().map(|(tok, _)| tok.clone())
    }

    /// Skip a balanced `(...)`, `[...]` or `{...}` group starting at the cursor
    fn skip_group(&mut self) -> Result<()> {
        let mut stack: Vec<&'static str> = Vec::new();
        loop {
            let Some(tok) = self.peek() else {
                let expected = stack.last().copied().unwrap_or("}");
                return Err(self.error(format!("unexpected end of input, expected '{}'", expected)));
            };
            if let Token::Punct(p) = tok {
                match p.as_str() {
                    "(" => stack.push(")"),
                    "[" => stack.push("]"),
                    "{" => stack.push("}"),
                    ")" | "]" | "}" => match stack.pop() {
                        Some(expected) if expected == p.as_str() => {}
                        Some(expected) => {
                            return Err(
                                self.error(format!("expected '{}', found '{}'", expected, p))
                            );
                        }
                        None => return Err(self.error(format!("unexpected '{}'", p))),
                    },
                    _ => {}
                }
            }
            self.pos += 1;
            if stack.is_empty() {
                return Ok(());
            }
        }
    }

    /// Consume a balanced `<...>` run starting at the cursor
    fn collect_angles(&mut self) -> Result<Vec<Token>> {
        let mut depth = 0usize;
        let mut collected = Vec::new();
        loop {
            let Some(tok) = self.peek().cloned() else {
                return Err(self.error("unexpected end of input, expected '>'"));
            };
            if tok.is_punct("(") || tok.is_punct("[") || tok.is_punct("{") {
                let start = self.pos;
                self.skip_group()?;
                collected.extend(self.tokens_since(start));
                continue;
            }
            if tok.is_punct(";") || tok.is_punct("}") || tok.is_punct(")") {
                return Err(self.error(format!("expected '>', found '{}'", tok.text())));
            }
            self.pos += 1;
            if tok.is_punct("<") {
                depth += 1;
            } else if tok.is_punct(">") {
                depth = depth.saturating_sub(1);
            }
            collected.push(tok);
            if depth == 0 {
                return Ok(collected);
            }
        }
    }

    /// Collect tokens up to (not including) one of `stops` at nesting depth 0
    fn collect_until(&mut self, stops: &[&str]) -> Result<Vec<Token>> {
        let mut collected = Vec::new();
        loop {
            let Some(tok) = self.peek().cloned() else {
                return Err(self.error("unexpected end of input"));
            };
            if let Token::Punct(p) = &tok {
                if stops.contains(&p.as_str()) || p == "}" {
                    return Ok(collected);
                }
                if p == "(" || p == "[" || p == "{" {
                    let start = self.pos;
                    self.skip_group()?;
                    collected.extend(self.tokens_since(start));
                    continue;
                }
                if p == ")" || p == "]" {
                    return Err(self.error(format!("unexpected '{}'", p)));
                }
            }
            collected.push(tok);
            self.pos += 1;
        }
    }

    /// Skip `[[...]]`, `alignas(...)`, `__attribute__((...))` and `__declspec(...)`
    fn skip_attributes(&mut self) -> Result<()> {
        loop {
            let is_attribute_list = self.at_punct("[")
                && self.peek_at(1).map_or(false, |t| t.is_punct("["));
            let is_attribute_call = matches!(
                self.peek().and_then(Token::as_ident),
                Some("alignas" | "__attribute__" | "__declspec")
            ) && self.peek_at(1).map_or(false, |t| t.is_punct("("));

            if is_attribute_list {
                self.skip_group()?;
            } else if is_attribute_call {
                self.pos += 1;
                self.skip_group()?;
            } else {
                return Ok(());
            }
        }
    }

    /// Skip one statement: up to `;`, or through a `{...}` body
    fn skip_statement(&mut self) -> Result<()> {
        loop {
            let Some(tok) = self.peek().cloned() else {
                return Ok(());
            };
            match &tok {
                Token::Punct(p) => match p.as_str() {
                    ";" => {
                        self.pos += 1;
                        return Ok(());
                    }
                    "{" => {
                        self.skip_group()?;
                        self.eat_punct(";");
                        return Ok(());
                    }
                    "(" | "[" => self.skip_group()?,
                    "}" => return Ok(()),
                    ")" | "]" => return Err(self.error(format!("unexpected '{}'", p))),
                    _ => self.pos += 1,
                },
                _ => self.pos += 1,
            }
        }
    }

    /// Read `template <...>` and return it as written in the source
    fn parse_template_header(&mut self) -> Result<String> {
        let start = self.offset();
        self.pos += 1;
        let mut end = start + "template".len();
        if self.at_punct("<") {
            self.collect_angles()?;
            end = self.tokens[self.pos - 1].1.end;
        }
        Ok(self.source[start..end].to_string())
    }

    // ----------------------------------------------------------------
    // Namespace scope
    // ----------------------------------------------------------------

    fn parse_namespace_body(&mut self, ctx: &Context, braced: bool) -> Result<()> {
        loop {
            match self.peek().map(|t| t.is_punct("}")) {
                None if braced => {
                    return Err(self.error("unexpected end of input, expected '}'"));
                }
                None => return Ok(()),
                Some(true) if braced => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(true) => return Err(self.error("unexpected '}'")),
                Some(false) => self.parse_namespace_item(ctx)?,
            }
        }
    }

    fn parse_namespace_item(&mut self, ctx: &Context) -> Result<()> {
        self.skip_attributes()?;
        let Some(tok) = self.peek().cloned() else {
            return Ok(());
        };
        match tok.text() {
            ";" => self.pos += 1,
            "namespace" => self.parse_namespace(ctx)?,
            "inline" if self.peek_at(1).map_or(false, |t| t.is_ident("namespace")) => {
                self.pos += 1;
                self.parse_namespace(ctx)?;
            }
            "extern"
                if matches!(self.peek_at(1), Some(Token::Literal(_)))
                    && self.peek_at(2).map_or(false, |t| t.is_punct("{")) =>
            {
                self.pos += 3;
                self.parse_namespace_body(ctx, true)?;
            }
            "template" => {
                let template = self.parse_template_header()?;
                self.skip_attributes()?;
                if !(self.at_class_key()
                    && self.try_class(ctx, ClassSite::top_level(Some(template)))?)
                {
                    self.skip_statement()?;
                }
            }
            "class" | "struct" | "union" => {
                if !self.try_class(ctx, ClassSite::top_level(None))? {
                    self.skip_statement()?;
                }
            }
            "enum" => match self.try_enum(ctx)? {
                Parsed::Definition(decl) => self.header.enums.push(decl),
                Parsed::Forward => {}
                Parsed::Usage => self.skip_statement()?,
            },
            "typedef" => self.parse_typedef(ctx)?,
            _ => self.skip_statement()?,
        }
        Ok(())
    }

    fn parse_namespace(&mut self, ctx: &Context) -> Result<()> {
        self.pos += 1;
        let mut segments = Vec::new();
        loop {
            self.skip_attributes()?;
            if self.eat_ident("inline") {
                continue;
            }
            match self.peek().cloned() {
                Some(Token::Ident(name)) => {
                    self.pos += 1;
                    segments.push(name);
                    if !self.eat_punct("::") {
                        break;
                    }
                }
                _ => break,
            }
        }

        if self.eat_punct("=") {
            return self.skip_statement();
        }
        self.expect_punct("{")?;

        let mut inner = ctx.clone();
        inner.namespaces.extend(segments);
        trace!(namespace = %inner.namespace(), "Entering namespace");
        self.parse_namespace_body(&inner, true)
    }

    fn parse_typedef(&mut self, ctx: &Context) -> Result<()> {
        self.pos += 1;
        if self.at_class_key() {
            let site = ClassSite {
                template: None,
                owner: None,
                typedef: true,
            };
            if self.try_class(ctx, site)? {
                return Ok(());
            }
        } else if self.at_ident("enum") {
            if let Parsed::Definition(mut decl) = self.try_enum_body(ctx, true)? {
                if decl.name.is_none() {
                    decl.name = self.typedef_alias();
                }
                self.header.enums.push(decl);
                return self.skip_statement();
            }
        }
        self.skip_statement()
    }

    /// Name introduced by `} Alias;` right after a typedef'd definition
    fn typedef_alias(&self) -> Option<String> {
        match (self.peek(), self.peek_at(1)) {
            (Some(Token::Ident(alias)), Some(next)) if next.is_punct(";") => Some(alias.clone()),
            _ => None,
        }
    }

    // ----------------------------------------------------------------
    // Classes
    // ----------------------------------------------------------------

    /// Parse a class, struct or union definition or forward declaration
    ///
    /// Returns `false`, with the cursor restored, when the keyword starts
    /// a declaration that only uses the type (`struct Foo* ptr;`).
    fn try_class(&mut self, ctx: &Context, site: ClassSite<'_>) -> Result<bool> {
        let start = self.pos;
        let kind = match self.peek().and_then(Token::as_ident) {
            Some("struct") => ContainerKind::Struct,
            Some("union") => ContainerKind::Union,
            _ => ContainerKind::Class,
        };
        self.pos += 1;

        let mut name: Option<String> = None;
        let mut ident_count = 0;
        loop {
            self.skip_attributes()?;
            match self.peek().cloned() {
                Some(Token::Ident(word)) if word == "final" => self.pos += 1,
                Some(Token::Ident(word)) => {
                    self.pos += 1;
                    ident_count += 1;
                    let mut full = word;
                    while self.at_punct("::") && matches!(self.peek_at(1), Some(Token::Ident(_))) {
                        full.push_str("::");
                        full.push_str(self.peek_at(1).map_or("", Token::text));
                        self.pos += 2;
                    }
                    name = Some(full);
                }
                Some(tok) if tok.is_punct("<") && name.is_some() => {
                    let args = self.collect_angles()?;
                    if let Some(n) = name.as_mut() {
                        n.push_str(&join_tokens(&args));
                    }
                }
                _ => break,
            }
        }

        let is_definition = match self.peek() {
            Some(t) if t.is_punct("{") => true,
            Some(t) if t.is_punct(":") => !matches!(self.peek_at(1), Some(Token::Number(_))),
            _ => false,
        };
        if !is_definition {
            if ident_count <= 1 && self.at_punct(";") && !site.typedef {
                self.pos += 1;
                return Ok(true);
            }
            self.pos = start;
            return Ok(false);
        }

        let declared_name = name.clone();
        let local_name = match name {
            Some(n) => n,
            None => {
                self.anon_count += 1;
                format!("<anon-{}-{}>", kind, self.anon_count)
            }
        };

        let mut decl = ClassDecl::new(ctx.qualify(&local_name), kind);
        decl.namespace = ctx.namespace();
        decl.parent = ctx.enclosing.clone().map(Box::new);
        decl.template = site.template;

        if self.eat_punct(":") {
            decl.inherits = self.parse_base_list(kind)?;
        }
        self.expect_punct("{")?;

        let inner = ctx.nested_in(decl.as_parent());
        self.parse_class_body(&mut decl, &inner)?;
        decl.is_abstract = decl.methods.iter().any(|(_, m)| m.is_pure_virtual);

        if site.typedef && declared_name.is_none() {
            if let Some(alias) = self.typedef_alias() {
                decl.name = ctx.qualify(&alias);
            }
        }

        let declarators = self.parse_trailing_declarators()?;
        if let (Some((owner, scope)), Some(type_name)) = (site.owner, declared_name.as_ref()) {
            for declarator in declarators {
                let mut type_tokens = vec![Token::Ident(type_name.clone())];
                type_tokens.extend(declarator.prefix);
                owner.properties.push(
                    scope,
                    VariableDecl {
                        name: declarator.name,
                        type_name: join_tokens(&type_tokens),
                        is_static: false,
                        is_array: declarator.is_array,
                    },
                );
            }
        }

        trace!(
            name = %decl.name,
            kind = %decl.kind,
            members = decl.properties.len() + decl.methods.len(),
            "Parsed class"
        );
        self.header.classes.push(decl);
        Ok(true)
    }

    fn parse_base_list(&mut self, kind: ContainerKind) -> Result<Vec<InheritDecl>> {
        let mut bases = Vec::new();
        loop {
            let mut access = kind.default_scope();
            let mut is_virtual = false;
            let mut type_tokens = Vec::new();
            loop {
                let Some(tok) = self.peek().cloned() else {
                    return Err(self.error("unexpected end of input in base class list"));
                };
                if tok.is_punct("{") || tok.is_punct(",") {
                    break;
                }
                if tok.is_punct(";") || tok.is_punct("}") || tok.is_punct(")") {
                    return Err(
                        self.error(format!("unexpected '{}' in base class list", tok.text()))
                    );
                }
                if tok.is_punct("<") {
                    type_tokens.extend(self.collect_angles()?);
                    continue;
                }
                if tok.is_punct("(") {
                    self.skip_group()?;
                    continue;
                }
                if tok.is_ident("virtual") {
                    is_virtual = true;
                    self.pos += 1;
                    continue;
                }
                if let Some(scope) = tok.as_ident().and_then(Scope::from_keyword) {
                    if type_tokens.is_empty() {
                        access = scope;
                        self.pos += 1;
                        continue;
                    }
                }
                type_tokens.push(tok);
                self.pos += 1;
            }
            if !type_tokens.is_empty() {
                bases.push(InheritDecl {
                    class: join_tokens(&type_tokens),
                    access,
                    is_virtual,
                });
            }
            if !self.eat_punct(",") {
                return Ok(bases);
            }
        }
    }

    fn parse_trailing_declarators(&mut self) -> Result<Vec<Declarator>> {
        let mut found = Vec::new();
        loop {
            let mut prefix = Vec::new();
            while let Some(tok) = self.peek().cloned() {
                if tok.is_punct("*") || tok.is_punct("&") || tok.is_punct("&&") || tok.is_ident("const") {
                    prefix.push(tok);
                    self.pos += 1;
                } else {
                    break;
                }
            }
            let Some(Token::Ident(name)) = self.peek().cloned() else {
                break;
            };
            if DECLARATION_KEYWORDS.contains(&name.as_str()) {
                break;
            }
            self.pos += 1;
            let is_array = self.skip_array_suffix()?;
            if self.eat_punct("=") {
                self.collect_until(&[",", ";"])?;
            } else if self.at_punct("{") {
                self.skip_group()?;
            }
            found.push(Declarator {
                name,
                prefix,
                is_array,
            });
            if !self.eat_punct(",") {
                break;
            }
        }
        self.eat_punct(";");
        Ok(found)
    }

    fn skip_array_suffix(&mut self) -> Result<bool> {
        let mut is_array = false;
        while self.at_punct("[") {
            self.skip_group()?;
            is_array = true;
        }
        Ok(is_array)
    }

    fn parse_class_body(&mut self, decl: &mut ClassDecl, ctx: &Context) -> Result<()> {
        let mut scope = decl.kind.default_scope();
        loop {
            self.skip_attributes()?;
            let Some(tok) = self.peek().cloned() else {
                return Err(self.error(format!(
                    "unexpected end of input in body of '{}', expected '}}'",
                    decl.name
                )));
            };

            if tok.is_punct("}") {
                self.pos += 1;
                return Ok(());
            }
            if tok.is_punct(";") {
                self.pos += 1;
                continue;
            }
            if let Some(access) = tok.as_ident().and_then(Scope::from_keyword) {
                // `public:` or Qt-style `public slots:`
                let colon_at = if matches!(self.peek_at(1), Some(Token::Ident(_))) { 2 } else { 1 };
                if self.peek_at(colon_at).map_or(false, |t| t.is_punct(":")) {
                    self.pos += colon_at + 1;
                    scope = access;
                    continue;
                }
            }

            match tok.text() {
                "signals" | "Q_SIGNALS" if self.peek_at(1).map_or(false, |t| t.is_punct(":")) => {
                    self.pos += 2;
                }
                "friend" | "using" | "typedef" | "static_assert" => self.skip_statement()?,
                "template" => {
                    let template = self.parse_template_header()?;
                    self.skip_attributes()?;
                    if self.at_ident("friend") {
                        self.skip_statement()?;
                    } else if self.at_class_key() {
                        let site = ClassSite {
                            template: Some(template),
                            owner: Some((&mut *decl, scope)),
                            typedef: false,
                        };
                        if !self.try_class(ctx, site)? {
                            self.parse_member(decl, scope, None)?;
                        }
                    } else {
                        self.parse_member(decl, scope, Some(template))?;
                    }
                }
                "class" | "struct" | "union" => {
                    let site = ClassSite {
                        template: None,
                        owner: Some((&mut *decl, scope)),
                        typedef: false,
                    };
                    if !self.try_class(ctx, site)? {
                        self.parse_member(decl, scope, None)?;
                    }
                }
                "enum" => match self.try_enum(ctx)? {
                    Parsed::Definition(nested) => decl.enums.push(scope, nested),
                    Parsed::Forward => {}
                    Parsed::Usage => self.parse_member(decl, scope, None)?,
                },
                _ => self.parse_member(decl, scope, None)?,
            }
        }
    }

    // ----------------------------------------------------------------
    // Members
    // ----------------------------------------------------------------

    fn parse_member(
        &mut self,
        decl: &mut ClassDecl,
        scope: Scope,
        template: Option<String>,
    ) -> Result<()> {
        let mut head: Vec<Token> = Vec::new();
        let mut angle_depth = 0usize;
        let mut is_static = false;
        let mut is_virtual = false;
        let mut is_destructor = false;
        let mut operator_name: Option<String> = None;

        loop {
            self.skip_attributes()?;
            let Some(tok) = self.peek().cloned() else {
                return Err(self.error(format!(
                    "unexpected end of input in body of '{}', expected '}}'",
                    decl.name
                )));
            };

            if tok.is_punct("}") {
                return Ok(());
            }
            let next_is_colon = self.peek_at(1).map_or(false, |t| t.is_punct(":"));
            if tok.as_ident().and_then(Scope::from_keyword).is_some() && next_is_colon {
                return Ok(());
            }

            match &tok {
                Token::Ident(word) if word == "operator" => {
                    self.pos += 1;
                    operator_name = Some(self.parse_operator_name()?);
                    break;
                }
                Token::Ident(word) if word == "static" => {
                    is_static = true;
                    self.pos += 1;
                    continue;
                }
                Token::Ident(word) if word == "virtual" => {
                    is_virtual = true;
                    self.pos += 1;
                    continue;
                }
                Token::Ident(word) if SPECIFIERS.contains(&word.as_str()) => {
                    self.pos += 1;
                    continue;
                }
                Token::Punct(p) if p == "~" => {
                    is_destructor = true;
                    self.pos += 1;
                    continue;
                }
                Token::Punct(p) if p == ")" || p == "]" => {
                    return Err(self.error(format!("unexpected '{}'", p)));
                }
                Token::Punct(p) if p == "<" => angle_depth += 1,
                Token::Punct(p) if p == ">" && angle_depth > 0 => angle_depth -= 1,
                Token::Punct(p)
                    if angle_depth == 0
                        && matches!(p.as_str(), "(" | ";" | "=" | "{" | "," | "[" | ":") =>
                {
                    break;
                }
                Token::Punct(p) if p == "(" || p == "[" || p == "{" => {
                    let start = self.pos;
                    self.skip_group()?;
                    head.extend(self.tokens_since(start));
                    continue;
                }
                _ => {}
            }
            head.push(tok);
            self.pos += 1;
        }

        if self.at_punct("(") {
            let pointer_declarator = operator_name.is_none()
                && self
                    .peek_at(1)
                    .map_or(false, |t| t.is_punct("*") || t.is_punct("&") || t.is_punct("^"));
            if pointer_declarator || (head.is_empty() && operator_name.is_none()) {
                return self.skip_statement();
            }
            let method = MethodHead {
                head,
                operator_name,
                is_static,
                is_virtual,
                is_destructor,
                template,
            };
            return self.parse_method(decl, scope, method);
        }

        self.parse_variables(decl, scope, head, is_static)
    }

    /// Name following the `operator` keyword, up to the parameter list
    fn parse_operator_name(&mut self) -> Result<String> {
        if self.at_punct("(") && self.peek_at(1).map_or(false, |t| t.is_punct(")")) {
            self.pos += 2;
            return Ok("operator()".to_string());
        }
        let mut parts = Vec::new();
        loop {
            let Some(tok) = self.peek().cloned() else {
                return Err(self.error("unexpected end of input after 'operator'"));
            };
            if tok.is_punct("(") {
                break;
            }
            if tok.is_punct(";") || tok.is_punct("{") || tok.is_punct("}") {
                return Err(self.error("expected '(' after operator name"));
            }
            parts.push(tok);
            self.pos += 1;
        }
        match parts.first() {
            Some(Token::Ident(_)) => Ok(format!("operator {}", join_tokens(&parts))),
            _ => Ok(format!(
                "operator{}",
                parts.iter().map(Token::text).collect::<String>()
            )),
        }
    }

    fn parse_method(&mut self, decl: &mut ClassDecl, scope: Scope, head: MethodHead) -> Result<()> {
        let MethodHead {
            head,
            operator_name,
            is_static,
            is_virtual,
            is_destructor,
            template,
        } = head;

        let (name, mut return_tokens) = match operator_name {
            Some(op) => (op, head),
            None => {
                let mut tokens = head;
                let name = match tokens.pop() {
                    Some(Token::Ident(n)) => n,
                    _ => return self.skip_statement(),
                };
                // `Outer::method` keeps only `method`
                while tokens.last().map_or(false, |t| t.is_punct("::")) {
                    tokens.pop();
                    tokens.pop();
                }
                (name, tokens)
            }
        };

        let parameters = self.parse_parameters()?;
        let mut method = MethodDecl {
            name,
            parameters,
            is_static,
            is_virtual,
            is_destructor,
            template,
            ..MethodDecl::default()
        };

        let mut trailing_return: Option<Vec<Token>> = None;
        while let Some(tok) = self.peek().cloned() {
            match tok.text() {
                "const" => {
                    method.is_const = true;
                    self.pos += 1;
                }
                "volatile" | "override" | "final" | "&" | "&&" | "try" => self.pos += 1,
                "noexcept" | "throw" => {
                    self.pos += 1;
                    if self.at_punct("(") {
                        self.skip_group()?;
                    }
                }
                "->" => {
                    self.pos += 1;
                    trailing_return = Some(self.collect_until(&["{", ";", "="])?);
                }
                "=" => {
                    self.pos += 1;
                    match self.peek().cloned() {
                        Some(Token::Number(n)) if n == "0" => {
                            method.is_pure_virtual = true;
                            self.pos += 1;
                        }
                        Some(t) if t.is_ident("delete") => {
                            method.is_deleted = true;
                            self.pos += 1;
                        }
                        Some(t) if t.is_ident("default") => self.pos += 1,
                        _ => {}
                    }
                }
                "[" if self.peek_at(1).map_or(false, |t| t.is_punct("[")) => self.skip_group()?,
                "{" => {
                    self.skip_group()?;
                    break;
                }
                ":" => {
                    self.skip_initializer_list()?;
                    break;
                }
                ";" => {
                    self.pos += 1;
                    break;
                }
                _ => break,
            }
        }

        if let Some(tokens) = trailing_return.filter(|t| !t.is_empty()) {
            return_tokens = tokens;
        }
        match return_tokens.last() {
            Some(t) if t.is_punct("*") => {
                method.returns_pointer = true;
                return_tokens.pop();
            }
            Some(t) if t.is_punct("&") || t.is_punct("&&") => {
                method.returns_reference = true;
                return_tokens.pop();
            }
            _ => {}
        }
        method.returns = join_tokens(&return_tokens);

        // A bare `NAME(...)` that is not a constructor is a macro invocation
        let is_constructor = method.name == constructor_name(&decl.name);
        if method.returns.is_empty()
            && !method.is_destructor
            && !method.name.starts_with("operator")
            && !is_constructor
        {
            trace!(name = %method.name, class = %decl.name, "Skipping macro-like member");
            return Ok(());
        }

        decl.methods.push(scope, method);
        Ok(())
    }

    /// Skip `: member(init), Base{init} { body }`
    fn skip_initializer_list(&mut self) -> Result<()> {
        self.pos += 1;
        loop {
            loop {
                let Some(tok) = self.peek() else {
                    return Err(self.error("unexpected end of input in initializer list"));
                };
                if tok.is_punct("(") || tok.is_punct("{") {
                    break;
                }
                if tok.is_punct(";") || tok.is_punct("}") {
                    return Err(self.error(format!(
                        "unexpected '{}' in initializer list",
                        tok.text()
                    )));
                }
                self.pos += 1;
            }
            self.skip_group()?;
            self.eat_punct("...");
            if !self.eat_punct(",") {
                break;
            }
        }
        if !self.at_punct("{") {
            return Err(self.error("expected constructor body after initializer list"));
        }
        self.skip_group()
    }

    fn parse_parameters(&mut self) -> Result<Vec<ParamDecl>> {
        self.expect_punct("(")?;
        let mut params = Vec::new();
        let mut current: Vec<Token> = Vec::new();
        let mut angle_depth = 0usize;
        loop {
            let Some(tok) = self.peek().cloned() else {
                return Err(self.error("unexpected end of input in parameter list"));
            };
            match &tok {
                Token::Punct(p) if p == ")" => {
                    self.pos += 1;
                    if !current.is_empty() {
                        params.push(make_param(current));
                    }
                    break;
                }
                Token::Punct(p) if p == "," && angle_depth == 0 => {
                    self.pos += 1;
                    params.push(make_param(std::mem::take(&mut current)));
                    continue;
                }
                Token::Punct(p) if p == "(" || p == "[" || p == "{" => {
                    let start = self.pos;
                    self.skip_group()?;
                    current.extend(self.tokens_since(start));
                    continue;
                }
                Token::Punct(p) if p == ";" || p == "}" || p == "]" => {
                    return Err(self.error(format!("unexpected '{}' in parameter list", p)));
                }
                Token::Punct(p) if p == "<" => angle_depth += 1,
                Token::Punct(p) if p == ">" => angle_depth = angle_depth.saturating_sub(1),
                _ => {}
            }
            current.push(tok);
            self.pos += 1;
        }

        if params.len() == 1 && params[0].type_name == "void" && params[0].name.is_empty() {
            params.clear();
        }
        Ok(params)
    }

    fn parse_variables(
        &mut self,
        decl: &mut ClassDecl,
        scope: Scope,
        mut head: Vec<Token>,
        is_static: bool,
    ) -> Result<()> {
        let mut name = match head.pop() {
            Some(Token::Ident(n)) if !head.is_empty() => n,
            _ => return self.skip_statement(),
        };

        let mut base = head.clone();
        while base
            .last()
            .map_or(false, |t| t.is_punct("*") || t.is_punct("&") || t.is_punct("&&"))
        {
            base.pop();
        }

        let mut type_tokens = head;
        loop {
            let is_array = self.skip_array_suffix()?;
            if self.eat_punct(":") {
                self.collect_until(&[",", ";", "=", "{"])?;
            }
            if self.eat_punct("=") {
                self.collect_until(&[",", ";"])?;
            } else if self.at_punct("{") {
                self.skip_group()?;
            }

            decl.properties.push(
                scope,
                VariableDecl {
                    name,
                    type_name: join_tokens(&type_tokens),
                    is_static,
                    is_array,
                },
            );

            if !self.eat_punct(",") {
                self.eat_punct(";");
                return Ok(());
            }

            let mut prefix = Vec::new();
            while let Some(tok) = self.peek().cloned() {
                if tok.is_punct("*") || tok.is_punct("&") || tok.is_punct("&&") {
                    prefix.push(tok);
                    self.pos += 1;
                } else {
                    break;
                }
            }
            match self.peek().cloned() {
                Some(Token::Ident(next)) => {
                    self.pos += 1;
                    name = next;
                    type_tokens = base.clone();
                    type_tokens.extend(prefix);
                }
                _ => return self.skip_statement(),
            }
        }
    }

    // ----------------------------------------------------------------
    // Enums
    // ----------------------------------------------------------------

    fn try_enum(&mut self, ctx: &Context) -> Result<Parsed<EnumDecl>> {
        self.try_enum_body(ctx, false)
    }

    fn try_enum_body(&mut self, ctx: &Context, typedef: bool) -> Result<Parsed<EnumDecl>> {
        let start = self.pos;
        self.pos += 1;
        let is_scoped = self.eat_ident("class") || self.eat_ident("struct");

        let mut name = None;
        let mut ident_count = 0;
        loop {
            self.skip_attributes()?;
            let Some(Token::Ident(word)) = self.peek().cloned() else {
                break;
            };
            self.pos += 1;
            ident_count += 1;
            let mut full = word;
            while self.at_punct("::") && matches!(self.peek_at(1), Some(Token::Ident(_))) {
                full.push_str("::");
                full.push_str(self.peek_at(1).map_or("", Token::text));
                self.pos += 2;
            }
            name = Some(full);
        }

        if ident_count <= 1 && self.at_punct(":") {
            // underlying type
            self.pos += 1;
            self.collect_until(&["{", ";"])?;
        }

        if self.at_punct(";") && ident_count <= 1 && !typedef {
            self.pos += 1;
            return Ok(Parsed::Forward);
        }
        if !self.at_punct("{") {
            self.pos = start;
            return Ok(Parsed::Usage);
        }
        self.pos += 1;

        let mut values = Vec::new();
        loop {
            let Some(tok) = self.peek().cloned() else {
                return Err(self.error("unexpected end of input in enum body, expected '}'"));
            };
            match tok {
                Token::Punct(p) if p == "}" => {
                    self.pos += 1;
                    break;
                }
                Token::Punct(p) if p == "(" || p == "[" || p == "{" => self.skip_group()?,
                Token::Punct(p) if p == ")" || p == "]" || p == ";" => {
                    return Err(self.error(format!("unexpected '{}' in enum body", p)));
                }
                Token::Ident(value_name) => {
                    self.pos += 1;
                    self.skip_attributes()?;
                    let value = if self.eat_punct("=") {
                        let expr = self.collect_until(&[","])?;
                        Some(expr.iter().map(Token::text).collect::<Vec<_>>().join(" "))
                    } else {
                        None
                    };
                    values.push(EnumValueDecl {
                        name: value_name,
                        value,
                    });
                }
                _ => self.pos += 1,
            }
        }

        if !typedef {
            // `} variable;` or just `};`
            self.skip_statement()?;
        }

        trace!(name = ?name, values = values.len(), "Parsed enum");
        Ok(Parsed::Definition(EnumDecl {
            name,
            namespace: ctx.namespace(),
            parent: ctx.enclosing.clone().map(Box::new),
            is_scoped,
            values,
        }))
    }
}

/// Pieces of a member declaration read before its parameter list
struct MethodHead {
    head: Vec<Token>,
    operator_name: Option<String>,
    is_static: bool,
    is_virtual: bool,
    is_destructor: bool,
    template: Option<String>,
}

/// Name a constructor of `class_name` must have
fn constructor_name(class_name: &str) -> &str {
    let local = class_name.rsplit("::").next().unwrap_or(class_name);
    local.split('<').next().unwrap_or(local)
}

fn make_param(mut tokens: Vec<Token>) -> ParamDecl {
    if let Some(eq) = tokens.iter().position(|t| t.is_punct("=")) {
        tokens.truncate(eq);
    }

    let mut is_array = false;
    if tokens.last().map_or(false, |t| t.is_punct("]")) {
        if let Some(open) = tokens.iter().rposition(|t| t.is_punct("[")) {
            tokens.truncate(open);
            is_array = true;
        }
    }

    let mut name = String::new();
    if tokens.len() > 1 {
        if let Some(Token::Ident(candidate)) = tokens.last() {
            let after_scope = tokens
                .get(tokens.len() - 2)
                .map_or(false, |t| t.is_punct("::"));
            let only_qualifiers_before = tokens[..tokens.len() - 1]
                .iter()
                .all(|t| TYPE_QUALIFIERS.contains(&t.text()));
            if !after_scope
                && !only_qualifiers_before
                && !BUILTIN_TYPES.contains(&candidate.as_str())
                && !TYPE_QUALIFIERS.contains(&candidate.as_str())
            {
                name = candidate.clone();
                tokens.pop();
            }
        }
    }

    let mut type_name = join_tokens(&tokens);
    if is_array {
        type_name.push_str("[]");
    }
    ParamDecl { type_name, name }
}

/// Join tokens into a normalized type string
fn join_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut prev: Option<&Token> = None;
    for tok in tokens {
        if let Some(p) = prev {
            if needs_space(p, tok) {
                out.push(' ');
            }
        }
        out.push_str(tok.text());
        prev = Some(tok);
    }
    normalize_type(&out)
}

fn needs_space(prev: &Token, next: &Token) -> bool {
    if matches!(prev.text(), "::" | "(" | "[" | "<") {
        return false;
    }
    !matches!(next.text(), "::" | "," | ")" | "(" | "[" | "]" | "<" | ">" | "...")
}
