use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use erpview::client::ErrorKind;
use erpview::config::{Config, ConfigStore};
use erpview::logging::init_tracing;
use erpview::query::{FilterCondition, FilterOp, FilterState, ListPage, Sort};
use erpview::resources::{self, Dynamic, ResourceDescriptor};
use erpview::session::{Access, SessionGate};
use erpview::ui::list::ListStatus;
use erpview::QueryClient;

#[derive(Debug, Parser)]
#[command(name = "erpview", version, about = "Browse and edit ERP collections over REST")]
struct Cli {
    /// Config file (default: ~/.config/erpview/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override api.base_url
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List built-in resources
    Resources,
    /// Fetch one page of a collection
    List(ListArgs),
    /// Fetch a single record
    Get {
        resource: String,
        id: String,
    },
    /// Create a record from a JSON body
    Create {
        resource: String,
        #[arg(long)]
        data: String,
    },
    /// Replace a record from a JSON body
    Update {
        resource: String,
        id: String,
        #[arg(long)]
        data: String,
    },
    Delete {
        resource: String,
        id: String,
    },
    /// Show whether a route needs a login
    CheckRoute {
        route: String,
    },
}

#[derive(Debug, Args)]
struct ListArgs {
    resource: String,
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long)]
    limit: Option<u32>,
    /// `field` or `field:ASC|DESC`
    #[arg(long, value_parser = parse_sort)]
    sort: Option<Sort>,
    #[arg(long)]
    search: Option<String>,
    /// `field:value` or `field:$op:value` (repeatable)
    #[arg(long = "filter", value_parser = parse_filter)]
    filters: Vec<(String, FilterCondition)>,
    /// `name=value` scope parameter such as `customerId=42` (repeatable)
    #[arg(long = "scope", value_parser = parse_scope)]
    scope: Vec<(String, String)>,
    /// Print the raw page as JSON
    #[arg(long)]
    json: bool,
}

fn parse_sort(s: &str) -> Result<Sort, String> {
    s.parse()
}

fn parse_filter(s: &str) -> Result<(String, FilterCondition), String> {
    let (field, rest) = s
        .split_once(':')
        .ok_or_else(|| format!("filter '{}' must look like field:value or field:$op:value", s))?;
    if field.is_empty() {
        return Err(format!("filter '{}' has no field", s));
    }

    let condition = match rest.strip_prefix('$') {
        Some(op_and_value) => {
            let (op, value) = op_and_value.split_once(':').unwrap_or((op_and_value, ""));
            let op: FilterOp = op.parse()?;
            if op != FilterOp::Null && value.is_empty() {
                return Err(format!("filter '{}' needs a value", s));
            }
            FilterCondition::new(op, value)
        }
        None => FilterCondition::eq(rest),
    };
    Ok((field.to_string(), condition))
}

fn parse_scope(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() && !value.is_empty() => {
            Ok((name.to_string(), value.to_string()))
        }
        _ => Err(format!("scope '{}' must look like name=value", s)),
    }
}

fn resolve(name: &str) -> Dynamic {
    Dynamic(resources::find(name).unwrap_or_else(|| ResourceDescriptor::new(name)))
}

fn parse_body(data: &str) -> anyhow::Result<Value> {
    serde_json::from_str(data).context("--data is not valid JSON")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let path = cli.config.clone().unwrap_or_else(Config::config_path);
    let store = ConfigStore::open(path)?;
    let mut config = store.get();
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
        config.validate()?;
    }

    let client = QueryClient::from_config(&config)?;
    let gate = SessionGate::from_config(&config.auth);

    let result = run(cli.command, &client, &gate).await;
    if let Err(err) = &result {
        let rejected = err
            .downcast_ref::<erpview::client::ApiError>()
            .is_some_and(|api| api.kind() == ErrorKind::Authorization);
        if rejected || !client.session().is_authenticated() {
            eprintln!("Login required: {}", gate.login_redirect("/"));
        }
    }
    result
}

async fn run(command: Command, client: &QueryClient, gate: &SessionGate) -> anyhow::Result<()> {
    match command {
        Command::Resources => {
            for d in resources::builtin() {
                let scope = if d.required_scope.is_empty() {
                    String::new()
                } else {
                    format!("  (requires {})", d.required_scope.join(", "))
                };
                println!("{:<24} /{:<24} sort {}{}", d.name, d.path, d.default_sort.to_param(), scope);
            }
            Ok(())
        }
        Command::List(args) => list(client, args).await,
        Command::Get { resource, id } => {
            let record = client.fetch_one(&resolve(&resource), &id, true).await?;
            println!("{}", serde_json::to_string_pretty(&*record)?);
            Ok(())
        }
        Command::Create { resource, data } => {
            let outcome = client
                .mutations()
                .create(&resolve(&resource), &parse_body(&data)?)
                .await?;
            print_record(outcome.record.as_ref())
        }
        Command::Update { resource, id, data } => {
            let outcome = client
                .mutations()
                .update(&resolve(&resource), &id, &parse_body(&data)?)
                .await?;
            print_record(outcome.record.as_ref())
        }
        Command::Delete { resource, id } => {
            client.mutations().delete(&resolve(&resource), &id).await?;
            println!("deleted {}/{}", resource, id);
            Ok(())
        }
        Command::CheckRoute { route } => {
            match gate.check(client.session(), &route) {
                Access::Allowed => println!("allowed"),
                Access::Redirect(url) => println!("redirect {}", url),
            }
            Ok(())
        }
    }
}

async fn list(client: &QueryClient, args: ListArgs) -> anyhow::Result<()> {
    let resource = resolve(&args.resource);
    let controller = client.list_view(resource);

    let mut filters: FilterState = controller.default_filters();
    filters.page = args.page;
    if let Some(limit) = args.limit {
        filters.limit = limit;
    }
    if let Some(sort) = args.sort {
        filters.sort = sort;
    }
    if let Some(search) = args.search {
        filters = filters.with_search(search);
    }
    for (field, condition) in args.filters {
        filters = filters.with_filter(field, condition);
    }
    for (name, value) in args.scope {
        filters = filters.with_scope(name, value);
    }

    let state = controller.initialize(filters).await;
    match &state.status {
        ListStatus::Idle if !state.missing_scope.is_empty() => bail!(
            "'{}' requires --scope {}=<value>",
            controller.resource().name,
            state.missing_scope.join("=<value> --scope ")
        ),
        ListStatus::Error(err) => return Err(anyhow!(err.message.clone())),
        _ => {}
    }

    let page = state
        .page
        .clone()
        .ok_or_else(|| anyhow!("no page was loaded"))?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&*page)?);
    } else {
        print_table(&page);
    }
    Ok(())
}

fn print_table(page: &ListPage<Value>) {
    for record in &page.data {
        println!("{}", record);
    }
    println!(
        "-- page {}/{} · {} items · {} per page",
        page.meta.current_page,
        page.meta.total_pages,
        page.meta.total_items,
        page.meta.items_per_page
    );
}

fn print_record(record: Option<&Value>) -> anyhow::Result<()> {
    match record {
        Some(record) => println!("{}", serde_json::to_string_pretty(record)?),
        None => println!("ok"),
    }
    Ok(())
}
