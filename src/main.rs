use std::io::BufRead;
use std::io::Write;

use anyhow::Result;
use clap::Parser;
use ring_dht::cli::Cli;
use ring_dht::config::Config;
use ring_dht::config::IdAssignment;
use ring_dht::logging::init_logging;
use ring_dht::processor::Processor;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.into());

    let mut config = match &cli.config {
        Some(path) => Config::read(path)?,
        None => Config::default(),
    };
    if let Some(bits) = cli.bits {
        config.bits = bits;
    }
    if let Some(order) = cli.order {
        config.order = order;
    }
    if !cli.machines.is_empty() {
        config.assignment = IdAssignment::Manual;
        config.machines = cli.machines.clone();
    }

    let mut processor = Processor::from_config(&config)?;
    println!(
        "ring-dht: {} bits, order {}, {} machine(s); type `help` for commands",
        config.bits,
        config.order,
        processor.ring().len()
    );
    repl(&mut processor)
}

fn repl(processor: &mut Processor) -> Result<()> {
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match dispatch(processor, &tokens) {
            Ok(Reply::Text(text)) => println!("{text}"),
            Ok(Reply::Quit) => return Ok(()),
            Ok(Reply::None) => {}
            Err(err) => println!("error: {err}"),
        }
    }
}

enum Reply {
    Text(String),
    None,
    Quit,
}

fn dispatch(processor: &mut Processor, tokens: &[&str]) -> Result<Reply> {
    match tokens {
        [] => Ok(Reply::None),
        ["help"] => Ok(Reply::Text(HELP.trim_end().to_owned())),
        ["quit"] | ["exit"] => Ok(Reply::Quit),
        ["join", id] => {
            processor.join(parse_id(id)?)?;
            Ok(Reply::Text("ok".into()))
        }
        ["leave", id] => {
            processor.leave(parse_id(id)?)?;
            Ok(Reply::Text("ok".into()))
        }
        ["put", start, name] => {
            let stored = processor.put(parse_id(start)?, name)?;
            Ok(Reply::Text(serde_json::to_string_pretty(&stored)?))
        }
        ["get", start, name] => {
            let located = processor.get(parse_id(start)?, name)?;
            Ok(Reply::Text(serde_json::to_string_pretty(&located)?))
        }
        ["del", start, name] => {
            let removed = processor.del(parse_id(start)?, name)?;
            Ok(Reply::Text(serde_json::to_string_pretty(&removed)?))
        }
        ["has", id] => Ok(Reply::Text(
            processor.ring().contains(parse_id(id)?).to_string(),
        )),
        ["count"] => Ok(Reply::Text(processor.ring().len().to_string())),
        ["ring"] | ["status"] => Ok(Reply::Text(serde_json::to_string_pretty(
            &processor.dump_ring(),
        )?)),
        ["fingers", id] => {
            let table = processor.dump_finger_table(parse_id(id)?)?;
            Ok(Reply::Text(serde_json::to_string_pretty(&table)?))
        }
        ["index", id] => {
            let index = processor.dump_index(parse_id(id)?)?;
            Ok(Reply::Text(serde_json::to_string_pretty(&index)?))
        }
        _ => Ok(Reply::Text(format!(
            "unknown command {:?}; type `help`",
            tokens.join(" ")
        ))),
    }
}

fn parse_id(token: &str) -> Result<u32> {
    token
        .parse()
        .map_err(|_| anyhow::anyhow!("expected a machine id, got {token:?}"))
}

const HELP: &str = "
commands:
  join <id>            add a machine
  leave <id>           remove a machine
  put <start> <name>   store a file, routing from <start>
  get <start> <name>   look a file up, routing from <start>
  del <start> <name>   delete a file, routing from <start>
  has <id>             whether a machine is on the ring
  count                number of machines
  ring                 dump the ring
  fingers <id>         dump a machine's finger table
  index <id>           dump a machine's B-tree
  quit                 exit
";
