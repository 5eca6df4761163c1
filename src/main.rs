use anyhow::{Context, Result};
use class_scanner::bindings::{Binding, BindingRegistry};
use class_scanner::classpath::{ClasspathResolver, discover_jars};
use class_scanner::cli::{Cli, Commands, KindArg, OutputFormat};
use class_scanner::filter::{AllOf, AnnotatedWith, Implements, KindIs, NamePrefix};
use class_scanner::model::{Type, TypeKind};
use class_scanner::project::Projector;
use class_scanner::visit::{CollectingVisitor, Walker};
use clap::Parser;
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Instant;

fn main() -> Result<()> {
    let cli = parse_cli();
    let resolver = build_resolver(&cli)?;

    match cli.command.clone() {
        Commands::Stats => {
            let output = stats(&resolver)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Scan {
            prefix,
            kind,
            annotated_with,
            implements,
            format,
        } => {
            let output = scan(&resolver, prefix, kind, annotated_with, implements)?;
            write_output(&render_scan(&output, format)?, None)?;
        }
        Commands::Inspect {
            class_name,
            format,
            output,
        } => {
            let class_name = normalize_class_name(&class_name);
            let result = inspect(&resolver, &class_name)?;
            write_output(&render_inspect(&result, format)?, output.as_deref())?;
        }
        Commands::Walk { class_name, format } => {
            let class_name = normalize_class_name(&class_name);
            let result = walk(&resolver, &class_name)?;
            write_output(&render_walk(&result, format)?, None)?;
        }
        Commands::Bindings {
            annotation,
            prefix,
            format,
        } => {
            let result = bindings(&resolver, &annotation, prefix)?;
            write_output(&render_bindings(&result, format)?, None)?;
        }
    }

    Ok(())
}

fn parse_cli() -> Cli {
    let args: Vec<String> = env::args().collect();
    Cli::parse_from(rewrite_args_for_implicit_inspect(args))
}

/// `class-scanner org.example.Foo` reads as `class-scanner inspect
/// org.example.Foo`; the first free token that is not a known subcommand
/// selects the implicit inspect.
fn rewrite_args_for_implicit_inspect(mut args: Vec<String>) -> Vec<String> {
    if args.len() <= 1 {
        return args;
    }

    let subcommands = ["scan", "inspect", "walk", "bindings", "stats", "help"];

    let mut idx = 1usize;
    while idx < args.len() {
        let a = args[idx].as_str();
        if a == "--" {
            idx += 1;
            break;
        }

        if a == "--classpath" || a == "-c" || a == "--jars" {
            idx += 2;
            continue;
        }

        if a.starts_with("--classpath=") || a.starts_with("--jars=") {
            idx += 1;
            continue;
        }

        if a.starts_with('-') {
            idx += 1;
            continue;
        }

        break;
    }

    if idx < args.len() {
        let token = args[idx].as_str();
        if !subcommands.contains(&token) {
            args.insert(idx, "inspect".to_string());
        }
    }

    args
}

fn build_resolver(cli: &Cli) -> Result<ClasspathResolver> {
    let mut paths = resolve_classpath_entries(cli);

    if let Some(base) = &cli.jars {
        let jars = discover_jars(base)
            .with_context(|| format!("jar discovery failed under {}", base.display()))?;
        if jars.is_empty() {
            eprintln!(
                "[class-scanner] no jar archives found under {}",
                base.display()
            );
        }
        paths.extend(jars);
    }

    if paths.is_empty() {
        let cwd = env::current_dir().context("failed to resolve current directory")?;
        eprintln!(
            "[class-scanner] no classpath given, scanning {}",
            cwd.display()
        );
        paths.push(cwd);
    }

    ClasspathResolver::from_paths(paths).context("invalid classpath configuration")
}

fn resolve_classpath_entries(cli: &Cli) -> Vec<PathBuf> {
    let mut raw: Vec<String> = cli.classpath.clone();
    if raw.is_empty()
        && let Ok(env_cp) = env::var("CLASSPATH")
        && !env_cp.trim().is_empty()
    {
        raw.push(env_cp);
    }

    let separator = if cfg!(windows) { ';' } else { ':' };
    let mut paths = Vec::new();
    for entry in raw {
        for part in entry.split(separator) {
            if part.trim().is_empty() {
                continue;
            }
            paths.push(PathBuf::from(part));
        }
    }
    paths
}

fn normalize_class_name(raw: &str) -> String {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("import") {
        s = rest.trim();
    }
    if s.ends_with(';') {
        s = s.trim_end_matches(';').trim();
    }
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

#[derive(Debug, Serialize)]
struct StatsOutput {
    roots: Vec<String>,
    classes: usize,
    packages: usize,
    duration_ms: u64,
}

#[derive(Debug, Serialize)]
struct ScanRow {
    name: String,
    kind: &'static str,
    origin: String,
    content_hash: String,
}

#[derive(Debug, Serialize)]
struct ScanOutput {
    roots: Vec<String>,
    matched: usize,
    duration_ms: u64,
    classes: Vec<ScanRow>,
}

#[derive(Debug, Serialize)]
struct OperationRow {
    name: String,
    descriptor: String,
    parameters: Vec<String>,
    returns: String,
    annotations: Vec<String>,
    synthesized: bool,
}

#[derive(Debug, Serialize)]
struct FieldRow {
    name: String,
    field_type: String,
    annotations: Vec<String>,
}

#[derive(Debug, Serialize)]
struct InspectOutput {
    class_name: String,
    origin: String,
    kind: &'static str,
    package: String,
    superclass: Option<String>,
    interfaces: Vec<String>,
    nested_classes: Vec<String>,
    fields: Vec<FieldRow>,
    constructors: Vec<OperationRow>,
    methods: Vec<OperationRow>,
    static_initializers: usize,
    annotations: Vec<String>,
    duration_ms: u64,
}

#[derive(Debug, Serialize)]
struct WalkOutput {
    class_name: String,
    visits: Vec<String>,
    duration_ms: u64,
}

#[derive(Debug, Serialize)]
struct BindingsOutput {
    annotation: String,
    inspected_classes: usize,
    registered: usize,
    duplicates: usize,
    bindings: Vec<Binding>,
    duration_ms: u64,
}

fn stats(resolver: &ClasspathResolver) -> Result<StatsOutput> {
    let start = Instant::now();
    let classes = resolver.list_classes()?;
    let packages = resolver.list_packages()?;
    Ok(StatsOutput {
        roots: resolver
            .roots()
            .iter()
            .map(|r| r.path().display().to_string())
            .collect(),
        classes: classes.len(),
        packages: packages.len(),
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

fn scan(
    resolver: &ClasspathResolver,
    prefix: Option<String>,
    kind: Option<KindArg>,
    annotated_with: Option<String>,
    implements: Option<String>,
) -> Result<ScanOutput> {
    let start = Instant::now();

    let mut filter = AllOf::new();
    if let Some(prefix) = prefix {
        filter = filter.push(NamePrefix(prefix));
    }
    if let Some(kind) = kind {
        filter = filter.push(KindIs(kind_of_arg(kind)));
    }
    if let Some(annotation) = annotated_with {
        filter = filter.push(AnnotatedWith(annotation));
    }
    if let Some(interface) = implements {
        filter = filter.push(Implements(interface));
    }

    let projections = Projector::new(resolver).collect(&filter)?;
    let classes: Vec<ScanRow> = projections
        .into_iter()
        .map(|p| ScanRow {
            name: p.ty.name.clone(),
            kind: p.ty.kind.label(),
            origin: p.origin,
            content_hash: p.content_hash,
        })
        .collect();

    Ok(ScanOutput {
        roots: resolver
            .roots()
            .iter()
            .map(|r| r.path().display().to_string())
            .collect(),
        matched: classes.len(),
        duration_ms: start.elapsed().as_millis() as u64,
        classes,
    })
}

fn kind_of_arg(kind: KindArg) -> TypeKind {
    match kind {
        KindArg::Class => TypeKind::Class,
        KindArg::Interface => TypeKind::Interface,
        KindArg::Enum => TypeKind::Enum,
        KindArg::Annotation => TypeKind::Annotation,
        KindArg::Inner => TypeKind::Inner,
    }
}

fn inspect(resolver: &ClasspathResolver, class_name: &str) -> Result<InspectOutput> {
    let start = Instant::now();
    let ty = Type::of(resolver, class_name)?;
    let resolved = ty.resolve(resolver)?;

    let nested_classes = ty
        .nested_classes(resolver)?
        .into_iter()
        .map(|n| n.name)
        .collect();

    let fields = ty
        .fields()
        .iter()
        .map(|f| FieldRow {
            name: f.name().to_string(),
            field_type: f.type_name().display(),
            annotations: f.annotations().iter().map(|a| a.type_name.clone()).collect(),
        })
        .collect();

    let constructors = ty.constructors().iter().map(operation_row).collect();
    let methods = ty.methods().iter().map(operation_row).collect();

    Ok(InspectOutput {
        class_name: ty.name.clone(),
        origin: resolved.origin,
        kind: ty.kind.label(),
        package: ty.package_name().to_string(),
        superclass: ty.superclass_name().map(str::to_string),
        interfaces: ty.interface_names().to_vec(),
        nested_classes,
        fields,
        constructors,
        methods,
        static_initializers: ty.static_initializers().len(),
        annotations: ty.annotations().iter().map(|a| a.type_name.clone()).collect(),
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

fn operation_row(op: &class_scanner::model::Operation) -> OperationRow {
    OperationRow {
        name: op.name.clone(),
        descriptor: op.descriptor.clone(),
        parameters: op
            .parameters()
            .iter()
            .map(|p| p.type_name.display())
            .collect(),
        returns: op.return_type().display(),
        annotations: op.annotations().iter().map(|a| a.type_name.clone()).collect(),
        synthesized: op.synthesized,
    }
}

fn walk(resolver: &ClasspathResolver, class_name: &str) -> Result<WalkOutput> {
    let start = Instant::now();
    let ty = Type::of(resolver, class_name)?;
    let mut visitor = CollectingVisitor::default();
    Walker::new(resolver).walk_type(&ty, &mut visitor)?;

    Ok(WalkOutput {
        class_name: ty.name,
        visits: visitor.lines,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

fn bindings(
    resolver: &ClasspathResolver,
    annotation: &str,
    prefix: Option<String>,
) -> Result<BindingsOutput> {
    let start = Instant::now();

    let mut filter = AllOf::new();
    if let Some(prefix) = prefix {
        filter = filter.push(NamePrefix(prefix));
    }

    let registry = BindingRegistry::new(annotation);
    let mut registered = 0usize;
    let mut duplicates = 0usize;
    for projection in Projector::new(resolver).collect(&filter)? {
        let outcome = registry.register_from(&projection.ty);
        registered += outcome.registered;
        duplicates += outcome.duplicates;
    }

    Ok(BindingsOutput {
        annotation: annotation.to_string(),
        inspected_classes: registry.inspected_count(),
        registered,
        duplicates,
        bindings: registry.bindings(),
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

fn render_scan(output: &ScanOutput, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(output)?,
        OutputFormat::Text => {
            let mut out = String::new();
            out.push_str(&format!("matched: {}\n", output.matched));
            out.push_str(&format!("duration_ms: {}\n", output.duration_ms));
            for row in &output.classes {
                out.push_str(&format!("- {} {} ({})\n", row.kind, row.name, row.origin));
            }
            out
        }
    })
}

fn render_inspect(output: &InspectOutput, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(output)?,
        OutputFormat::Text => {
            let mut out = String::new();
            out.push_str(&format!("{} {}\n", output.kind, output.class_name));
            out.push_str(&format!("origin: {}\n", output.origin));
            if let Some(superclass) = &output.superclass {
                out.push_str(&format!("extends: {superclass}\n"));
            }
            for interface in &output.interfaces {
                out.push_str(&format!("implements: {interface}\n"));
            }
            for nested in &output.nested_classes {
                out.push_str(&format!("nested: {nested}\n"));
            }
            for field in &output.fields {
                out.push_str(&format!("field: {} {}\n", field.field_type, field.name));
            }
            for ctor in &output.constructors {
                out.push_str(&format!(
                    "constructor: ({}){}\n",
                    ctor.parameters.join(", "),
                    if ctor.synthesized { " [synthesized]" } else { "" }
                ));
            }
            for method in &output.methods {
                out.push_str(&format!(
                    "method: {} {}({})\n",
                    method.returns,
                    method.name,
                    method.parameters.join(", ")
                ));
            }
            for annotation in &output.annotations {
                out.push_str(&format!("annotation: @{annotation}\n"));
            }
            out
        }
    })
}

fn render_walk(output: &WalkOutput, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(output)?,
        OutputFormat::Text => {
            let mut out = String::new();
            for visit in &output.visits {
                out.push_str(visit);
                out.push('\n');
            }
            out
        }
    })
}

fn render_bindings(output: &BindingsOutput, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(output)?,
        OutputFormat::Text => {
            let mut out = String::new();
            out.push_str(&format!(
                "inspected: {}, registered: {}, duplicates: {}\n",
                output.inspected_classes, output.registered, output.duplicates
            ));
            for b in &output.bindings {
                out.push_str(&format!("- {} -> {} via {}#{}\n", b.from, b.to, b.owner, b.method));
            }
            out
        }
    })
}

fn write_output(content: &str, output: Option<&Path>) -> Result<()> {
    if let Some(path) = output {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
    } else {
        print!("{content}");
        if !content.ends_with('\n') {
            println!();
        }
    }

    Ok(())
}
