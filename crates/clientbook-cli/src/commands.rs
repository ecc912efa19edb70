// One function per subcommand: build the registry request, run it, print
// the result. Soft outcomes are printed and exit 0; store errors propagate.

use anyhow::{Context, Result};
use clientbook_core::db::Connection;
use clientbook_core::{
    ClientChanges, ClientQuery, ClientRecord, ClientRegistry, NewClient, Outcome, PhoneList,
};

use crate::{AddArgs, Command, FindArgs, UpdateArgs};

pub(crate) fn run(conn: &mut Connection, command: Command) -> Result<()> {
    let mut registry = ClientRegistry::new(conn);

    match command {
        Command::Init => {
            registry.initialize_schema().context("failed to create tables")?;
            println!("tables phone_number and personal_information created");
        }
        Command::Drop => {
            registry.drop_schema().context("failed to drop tables")?;
            println!("tables phone_number and personal_information dropped");
        }
        Command::Add(args) => add(&mut registry, args)?,
        Command::AddPhone { client_id, phone } => {
            let outcome = registry
                .add_phone(client_id, phone)
                .with_context(|| format!("failed to add phone {phone} for client {client_id}"))?;
            print_outcome(outcome, |_| format!("phone {phone} added for client {client_id}"));
        }
        Command::Update(args) => update(&mut registry, args)?,
        Command::DeletePhone { client_id, phone } => {
            let outcome = registry
                .delete_phone(client_id, phone)
                .with_context(|| format!("failed to delete phone {phone} of client {client_id}"))?;
            print_outcome(outcome, |rows| {
                format!("phone {phone} removed from client {client_id} ({rows} row(s))")
            });
        }
        Command::Delete { client_id } => {
            let outcome = registry
                .delete_client(client_id)
                .with_context(|| format!("failed to delete client {client_id}"))?;
            print_outcome(outcome, |phones| {
                format!("client {client_id} deleted along with {phones} phone(s)")
            });
        }
        Command::Show { client_id, json } => match registry.get_client(client_id)? {
            Some(client) if json => println!("{}", serde_json::to_string_pretty(&client)?),
            Some(client) => {
                let p = &client.person;
                println!("{} {} {} <{}>", p.id, p.first_name, p.last_name, p.email);
                for phone in &client.phones {
                    println!("  {}", phone.number);
                }
            }
            None => println!("client {client_id} does not exist"),
        },
        Command::Find(args) => find(&registry, args)?,
        Command::List { json } => {
            let records = registry.list_clients()?;
            print_records(&records, json)?;
        }
    }

    Ok(())
}

fn add(registry: &mut ClientRegistry<'_>, args: AddArgs) -> Result<()> {
    let phones = match args.phones.as_deref() {
        Some(text) => text.parse::<PhoneList>()?,
        None => PhoneList::new(),
    };
    let client = NewClient::new(args.first_name, args.last_name, args.email).with_phones(phones);

    let outcome = registry
        .add_client(&client)
        .with_context(|| format!("failed to add client {}", client.email))?;
    print_outcome(outcome, |id| {
        format!(
            "client {} {} added with id {id}",
            client.first_name, client.last_name
        )
    });
    Ok(())
}

fn update(registry: &mut ClientRegistry<'_>, args: UpdateArgs) -> Result<()> {
    let client_id = args.client_id;
    let changes = ClientChanges {
        first_name: args.first_name,
        last_name: args.last_name,
        email: args.email,
        previous_phone: args.previous_phone,
        new_phone: args.new_phone,
    };
    if changes.is_empty() {
        println!("nothing to change for client {client_id}");
        return Ok(());
    }

    match registry
        .update_client(client_id, &changes)
        .with_context(|| format!("failed to update client {client_id}"))?
    {
        Outcome::Done(report) => {
            for change in &report.applied {
                println!("client {client_id}: {change}");
            }
            for reason in &report.skipped {
                println!("client {client_id}: {reason}");
            }
        }
        Outcome::Skipped(reason) => println!("{reason}"),
    }
    Ok(())
}

fn find(registry: &ClientRegistry<'_>, args: FindArgs) -> Result<()> {
    let query = ClientQuery {
        first_name: args.first_name,
        last_name: args.last_name,
        email: args.email,
        phone: args.phone,
    };
    if query.is_empty() {
        anyhow::bail!("give at least one of --first-name, --last-name, --email, --phone");
    }

    let records = registry.find_client(&query)?;
    print_records(&records, args.json)
}

fn print_outcome<T>(outcome: Outcome<T>, on_done: impl FnOnce(T) -> String) {
    match outcome {
        Outcome::Done(value) => println!("{}", on_done(value)),
        Outcome::Skipped(reason) => println!("{reason}"),
    }
}

fn print_records(records: &[ClientRecord], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("no clients found");
        return Ok(());
    }
    for r in records {
        let phone = r.phone.map(|n| n.to_string()).unwrap_or_else(|| "-".into());
        println!(
            "{:>4}  {:<20} {:<20} {:<30} {}",
            r.id, r.first_name, r.last_name, r.email, phone
        );
    }
    Ok(())
}
