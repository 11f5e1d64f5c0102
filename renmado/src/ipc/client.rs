use std::io::{BufRead, BufReader, Write};

use anyhow::{bail, Context, Result};

use renmado_ipc::{Command, ControlEvent, EventFilter, Response, SubscribeRequest};

use super::transport::{connect, ClientStream, COMMAND_ENDPOINT, EVENT_ENDPOINT};

pub struct IpcClient {
    writer: ClientStream,
    reader: BufReader<ClientStream>,
}

impl IpcClient {
    pub fn connect() -> Result<Self> {
        let stream = connect(COMMAND_ENDPOINT).context("Failed to connect to renmado daemon")?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self {
            writer: stream,
            reader,
        })
    }

    pub fn send(&mut self, cmd: &Command) -> Result<Response> {
        let json = serde_json::to_string(cmd)?;
        writeln!(self.writer, "{}", json)?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            bail!("Daemon closed the connection");
        }

        let response: Response = serde_json::from_str(&line)?;
        Ok(response)
    }
}

/// Client for the control event stream
pub struct EventClient {
    reader: BufReader<ClientStream>,
}

impl EventClient {
    pub fn connect(request: &SubscribeRequest) -> Result<Self> {
        let mut stream =
            connect(EVENT_ENDPOINT).context("Failed to connect to renmado event server")?;

        let json = serde_json::to_string(request)?;
        writeln!(stream, "{}", json)?;
        stream.flush()?;

        Ok(Self {
            reader: BufReader::new(stream),
        })
    }

    /// Blocks until the next event; `None` once the daemon hangs up.
    pub fn next_event(&mut self) -> Result<Option<ControlEvent>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&line)?))
    }
}

/// Subscribe and print events to stdout, one JSON object per line
pub fn subscribe_and_print(filter: EventFilter) -> Result<()> {
    let request = SubscribeRequest { filter };
    let mut client = EventClient::connect(&request)?;

    while let Some(event) = client.next_event()? {
        println!("{}", serde_json::to_string(&event)?);
    }

    Ok(())
}
