//! Static evaluation of JavaScript configuration modules.
//!
//! The module is parsed with oxc and its exports are evaluated *without running
//! anything*: literal data, references to top-level bindings and `require(...)`
//! calls are understood, everything else is rejected with the offending span.
//!
//! Recognised export forms:
//! - `export const content = ...` (and `export { content }`)
//! - `export default { ... }` / `export default config`
//! - `module.exports = { ... }`, `module.exports.content = ...`, `exports.content = ...`

use std::collections::{HashMap, HashSet};
use std::path::Path;

use miette::SourceSpan;
use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Argument, ArrayExpressionElement, AssignmentTarget, BindingPatternKind, CallExpression,
    Declaration, Expression, ModuleExportName, ObjectPropertyKind, Program, Statement,
    VariableDeclaration,
};
use oxc_parser::{Parser, ParserReturn};
use oxc_span::{GetSpan, SourceType, Span};
use tracing::{debug, trace};

use crate::configuration::{
    error::ConfigError,
    format::SourceFormat,
    value::{ConfigValue, ModuleReference, Table},
};

/// Exports that must evaluate; anything else that cannot be evaluated is skipped.
const REQUIRED_EXPORTS: [&str; 3] = ["content", "theme", "plugins"];

/// How many bindings deep `const a = b` chains are followed.
const MAX_BINDING_DEPTH: usize = 64;


struct Unsupported {
    message: String,
    span: Span,
}

impl Unsupported {
    fn new<M: Into<String>>(message: M, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    fn source_span(&self) -> SourceSpan {
        SourceSpan::from((self.span.start as usize, self.span.size() as usize))
    }
}


pub(crate) fn read_javascript(path: &Path, source: &str) -> Result<Table, ConfigError> {
    let allocator = Allocator::default();
    let source_type = SourceType::from_path(path).unwrap_or_else(|_| SourceType::mjs());

    let ParserReturn {
        program, errors, ..
    } = Parser::new(&allocator, source, source_type).parse();

    if let Some(error) = errors.first() {
        let span = error
            .labels
            .as_ref()
            .and_then(|labels| labels.first())
            .map(|label| SourceSpan::from((label.offset(), label.len())));

        return Err(ConfigError::parse(
            path,
            SourceFormat::JavaScript,
            source,
            error.message.to_string(),
            span,
        ));
    }

    let exports = ModuleExports::collect(&program);
    trace!(
        "JavaScript module has {} top-level binding(s), {} named export(s), default export: {}.",
        exports.bindings.len(),
        exports.named.len(),
        exports.default.is_some()
    );

    exports.evaluate().map_err(|unsupported| {
        let span = unsupported.source_span();
        ConfigError::parse(
            path,
            SourceFormat::JavaScript,
            source,
            unsupported.message,
            Some(span),
        )
    })
}


enum ExportSource<'p, 'a> {
    Expression(&'p Expression<'a>),
    Binding { local: String, span: Span },
}

impl ExportSource<'_, '_> {
    fn span(&self) -> Span {
        match self {
            Self::Expression(expression) => expression.span(),
            Self::Binding { span, .. } => *span,
        }
    }
}

struct ModuleExports<'p, 'a> {
    bindings: HashMap<String, &'p Expression<'a>>,
    default: Option<ExportSource<'p, 'a>>,
    named: Vec<(String, ExportSource<'p, 'a>)>,
}

impl<'p, 'a> ModuleExports<'p, 'a> {
    fn collect(program: &'p Program<'a>) -> Self {
        let mut exports = Self {
            bindings: HashMap::new(),
            default: None,
            named: Vec::new(),
        };

        for statement in program.body.iter() {
            match statement {
                Statement::VariableDeclaration(variable) => {
                    exports.record_declaration(variable, false);
                }
                Statement::ExportNamedDeclaration(export) => {
                    if export.source.is_some() {
                        debug!("Ignoring re-export from another module.");
                        continue;
                    }

                    if let Some(Declaration::VariableDeclaration(variable)) = &export.declaration {
                        exports.record_declaration(variable, true);
                    }

                    for specifier in export.specifiers.iter() {
                        let exported = module_export_name(&specifier.exported);
                        let source = ExportSource::Binding {
                            local: module_export_name(&specifier.local),
                            span: specifier.span,
                        };

                        // export { config as default }
                        if exported == "default" {
                            exports.default = Some(source);
                        } else {
                            exports.named.push((exported, source));
                        }
                    }
                }
                Statement::ExportDefaultDeclaration(export) => {
                    match export.declaration.as_expression() {
                        Some(expression) => {
                            exports.default = Some(ExportSource::Expression(expression));
                        }
                        None => debug!("Ignoring default export that is not an expression."),
                    }
                }
                Statement::ExpressionStatement(statement) => {
                    if let Expression::AssignmentExpression(assignment) = &statement.expression {
                        exports.record_assignment(&assignment.left, &assignment.right);
                    }
                }
                _ => {}
            }
        }

        exports
    }

    fn record_declaration(&mut self, variable: &'p VariableDeclaration<'a>, exported: bool) {
        for declarator in variable.declarations.iter() {
            let BindingPatternKind::BindingIdentifier(identifier) = &declarator.id.kind else {
                continue;
            };
            let Some(init) = &declarator.init else {
                continue;
            };

            let name = identifier.name.to_string();
            if exported {
                self.named
                    .push((name.clone(), ExportSource::Expression(init)));
            }
            self.bindings.insert(name, init);
        }
    }

    fn record_assignment(&mut self, target: &'p AssignmentTarget<'a>, value: &'p Expression<'a>) {
        let AssignmentTarget::StaticMemberExpression(member) = target else {
            return;
        };
        let property = member.property.name.to_string();

        match &member.object {
            // module.exports = { ... }
            Expression::Identifier(object)
                if object.name.as_str() == "module" && property == "exports" =>
            {
                self.default = Some(ExportSource::Expression(value));
            }
            // exports.content = ...
            Expression::Identifier(object) if object.name.as_str() == "exports" => {
                self.named.push((property, ExportSource::Expression(value)));
            }
            // module.exports.content = ...
            Expression::StaticMemberExpression(inner)
                if inner.property.name.as_str() == "exports"
                    && matches!(&inner.object, Expression::Identifier(object) if object.name.as_str() == "module") =>
            {
                self.named.push((property, ExportSource::Expression(value)));
            }
            _ => {}
        }
    }


    fn evaluate(&self) -> Result<Table, Unsupported> {
        let mut table = match &self.default {
            None => Table::new(),
            Some(source) => match self.evaluate_source(source)? {
                ConfigValue::Table(table) => table,
                other => {
                    return Err(Unsupported::new(
                        format!("the default export must be an object, found {}", other.type_name()),
                        source.span(),
                    ));
                }
            },
        };

        for (name, source) in &self.named {
            let value = self.evaluate_source(source);

            match value {
                Ok(value) => {
                    table.remove(name);
                    table.insert(name.as_str(), value);
                }
                Err(unsupported) if !REQUIRED_EXPORTS.contains(&name.as_str()) => {
                    debug!(
                        "Skipping export `{name}`, it cannot be evaluated statically: {}",
                        unsupported.message
                    );
                }
                Err(unsupported) => return Err(unsupported),
            }
        }

        // Module references only ever come from `require(...)` here; object literals
        // shaped like `{ module: "..." }` stay tables.
        Ok(table)
    }

    fn evaluate_source(&self, source: &ExportSource<'p, 'a>) -> Result<ConfigValue, Unsupported> {
        match source {
            ExportSource::Expression(expression) => self.evaluate_expression(expression, 0),
            ExportSource::Binding { local, span } => self.evaluate_binding(local, *span, 0),
        }
    }

    fn evaluate_expression(
        &self,
        expression: &Expression<'a>,
        depth: usize,
    ) -> Result<ConfigValue, Unsupported> {
        match expression {
            Expression::StringLiteral(literal) => Ok(ConfigValue::String(literal.value.to_string())),
            Expression::NumericLiteral(literal) => Ok(ConfigValue::number(literal.value)),
            Expression::BooleanLiteral(literal) => Ok(ConfigValue::Bool(literal.value)),
            Expression::NullLiteral(_) => Ok(ConfigValue::Null),
            Expression::TemplateLiteral(template) => {
                if !template.expressions.is_empty() {
                    return Err(Unsupported::new(
                        "template literals with substitutions cannot be evaluated statically",
                        template.span,
                    ));
                }

                let text: String = template
                    .quasis
                    .iter()
                    .map(|quasi| {
                        quasi
                            .value
                            .cooked
                            .as_ref()
                            .unwrap_or(&quasi.value.raw)
                            .as_str()
                    })
                    .collect();

                Ok(ConfigValue::String(text))
            }
            Expression::ArrayExpression(array) => {
                let mut items = Vec::with_capacity(array.elements.len());

                for element in array.elements.iter() {
                    match element {
                        ArrayExpressionElement::SpreadElement(spread) => {
                            match self.evaluate_expression(&spread.argument, depth)? {
                                ConfigValue::Array(spread_items) => items.extend(spread_items),
                                other => {
                                    return Err(Unsupported::new(
                                        format!("cannot spread a {} into an array", other.type_name()),
                                        spread.span,
                                    ));
                                }
                            }
                        }
                        ArrayExpressionElement::Elision(elision) => {
                            return Err(Unsupported::new(
                                "array holes are not supported",
                                elision.span,
                            ));
                        }
                        _ => match element.as_expression() {
                            Some(expression) => items.push(self.evaluate_expression(expression, depth)?),
                            None => {
                                return Err(Unsupported::new(
                                    "unsupported array element",
                                    element.span(),
                                ));
                            }
                        },
                    }
                }

                Ok(ConfigValue::Array(items))
            }
            Expression::ObjectExpression(object) => {
                let mut table = Table::new();
                // Keys that came from a spread may legitimately be overridden later.
                let mut spread_keys: HashSet<String> = HashSet::new();

                for property in object.properties.iter() {
                    match property {
                        ObjectPropertyKind::ObjectProperty(property) => {
                            if property.method {
                                return Err(Unsupported::new(
                                    "methods cannot be evaluated statically",
                                    property.span,
                                ));
                            }

                            let Some(key) = property.key.static_name() else {
                                return Err(Unsupported::new(
                                    "computed keys cannot be evaluated statically",
                                    property.key.span(),
                                ));
                            };
                            let key = key.to_string();
                            let value = self.evaluate_expression(&property.value, depth)?;

                            if spread_keys.remove(&key) {
                                table.remove(&key);
                            }
                            table.insert(key, value);
                        }
                        ObjectPropertyKind::SpreadProperty(spread) => {
                            match self.evaluate_expression(&spread.argument, depth)? {
                                ConfigValue::Table(spread_table) => {
                                    for (key, value) in spread_table {
                                        table.remove(&key);
                                        spread_keys.insert(key.clone());
                                        table.insert(key, value);
                                    }
                                }
                                other => {
                                    return Err(Unsupported::new(
                                        format!("cannot spread a {} into an object", other.type_name()),
                                        spread.span,
                                    ));
                                }
                            }
                        }
                    }
                }

                Ok(ConfigValue::Table(table))
            }
            Expression::ParenthesizedExpression(parenthesized) => {
                self.evaluate_expression(&parenthesized.expression, depth)
            }
            Expression::UnaryExpression(unary) if unary.operator.as_str() == "-" => {
                match self.evaluate_expression(&unary.argument, depth)? {
                    ConfigValue::Integer(value) => Ok(ConfigValue::Integer(-value)),
                    ConfigValue::Float(value) => Ok(ConfigValue::Float(-value)),
                    other => Err(Unsupported::new(
                        format!("cannot negate a {}", other.type_name()),
                        unary.span,
                    )),
                }
            }
            Expression::Identifier(identifier) => {
                self.evaluate_binding(identifier.name.as_str(), identifier.span, depth)
            }
            Expression::CallExpression(call) => self.evaluate_call(call, depth),
            // require("x").default
            Expression::StaticMemberExpression(member)
                if member.property.name.as_str() == "default" =>
            {
                match self.evaluate_expression(&member.object, depth)? {
                    ConfigValue::Module(reference) => Ok(ConfigValue::Module(reference)),
                    _ => Err(Unsupported::new(
                        "`.default` is only supported on required modules",
                        member.span,
                    )),
                }
            }
            other => Err(Unsupported::new(
                "this expression cannot be evaluated statically",
                other.span(),
            )),
        }
    }

    fn evaluate_binding(
        &self,
        name: &str,
        span: Span,
        depth: usize,
    ) -> Result<ConfigValue, Unsupported> {
        if name == "undefined" {
            return Ok(ConfigValue::Null);
        }

        if depth >= MAX_BINDING_DEPTH {
            return Err(Unsupported::new(
                format!("`{name}` refers to itself"),
                span,
            ));
        }

        match self.bindings.get(name) {
            Some(expression) => self.evaluate_expression(expression, depth + 1),
            None => Err(Unsupported::new(
                format!("`{name}` is not a top-level binding of this module"),
                span,
            )),
        }
    }

    fn evaluate_call(
        &self,
        call: &CallExpression<'a>,
        depth: usize,
    ) -> Result<ConfigValue, Unsupported> {
        let argument = match call.arguments.first() {
            Some(argument) if call.arguments.len() == 1 => argument,
            _ => {
                return Err(Unsupported::new(
                    "calls must have exactly one argument",
                    call.span,
                ));
            }
        };

        match &call.callee {
            Expression::Identifier(callee)
                if callee.name.as_str() == "require" && !self.bindings.contains_key("require") =>
            {
                match argument {
                    Argument::StringLiteral(literal) => Ok(ConfigValue::Module(ModuleReference::new(
                        literal.value.as_str(),
                    ))),
                    other => Err(Unsupported::new(
                        "`require` takes a string literal",
                        other.span(),
                    )),
                }
            }
            // require("x")(options), or a binding holding require("x")
            callee => match self.evaluate_expression(callee, depth)? {
                ConfigValue::Module(reference) if reference.options.is_none() => {
                    let Some(options) = argument.as_expression() else {
                        return Err(Unsupported::new(
                            "plugin options cannot be spread",
                            argument.span(),
                        ));
                    };

                    match self.evaluate_expression(options, depth)? {
                        ConfigValue::Table(options) => {
                            Ok(ConfigValue::Module(reference.with_options(options)))
                        }
                        other => Err(Unsupported::new(
                            format!("plugin options must be an object, found {}", other.type_name()),
                            argument.span(),
                        )),
                    }
                }
                _ => Err(Unsupported::new(
                    "only `require(...)` and required modules can be called",
                    call.span,
                )),
            },
        }
    }
}


fn module_export_name(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::IdentifierName(identifier) => identifier.name.to_string(),
        ModuleExportName::IdentifierReference(identifier) => identifier.name.to_string(),
        ModuleExportName::StringLiteral(literal) => literal.value.to_string(),
    }
}
