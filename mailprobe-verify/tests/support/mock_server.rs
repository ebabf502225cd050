//! Mock SMTP server for exercising verification scenarios.
//!
//! A configurable mock exchanger that can:
#![allow(dead_code)] // Test utility module - not all methods used in every test
//! - Answer each command with a configured (possibly multi-line) response
//! - Play back a scripted sequence of `RCPT TO` responses (e.g. greylist
//!   first, accept second)
//! - Inject failures: hang on the Nth command, delay every response
//! - Record received commands for verification
//! - Track connection counts through a shareable [`ConnectionGauge`]

use std::{
    collections::VecDeque,
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::{Mutex, RwLock},
    time::timeout,
};

/// SMTP command received by the mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCommand {
    /// HELO command with hostname
    Helo(String),
    /// MAIL FROM command
    MailFrom(String),
    /// RCPT TO command
    RcptTo(String),
    /// RSET command
    Rset,
    /// QUIT command
    Quit,
    /// Unknown/other command
    Other(String),
}

impl MockCommand {
    /// Returns `true` for `RCPT TO` commands.
    pub const fn is_rcpt(&self) -> bool {
        matches!(self, Self::RcptTo(_))
    }
}

/// One configured response, single- or multi-line.
#[derive(Debug, Clone)]
pub struct MockResponse {
    code: u16,
    lines: Vec<String>,
}

impl MockResponse {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            lines: vec![message.into()],
        }
    }

    pub fn multi_line(code: u16, lines: Vec<String>) -> Self {
        Self { code, lines }
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut wire = String::new();
        let count = self.lines.len();
        for (index, line) in self.lines.iter().enumerate() {
            let separator = if index + 1 < count { '-' } else { ' ' };
            wire.push_str(&format!("{}{}{}\r\n", self.code, separator, line));
        }
        wire.into_bytes()
    }
}

/// Connection counters, shareable across several mock servers so the global
/// admission invariant can be asserted process-wide.
#[derive(Debug, Clone, Default)]
pub struct ConnectionGauge {
    current: Arc<AtomicUsize>,
    high_water: Arc<AtomicUsize>,
    total: Arc<AtomicUsize>,
}

impl ConnectionGauge {
    pub fn new() -> Self {
        Self::default()
    }

    fn connected(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
    }

    fn disconnected(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    /// The highest number of simultaneously open connections observed.
    pub fn max_concurrent(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }

    /// How many connections were accepted in total.
    pub fn total_connections(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

/// Mock server configuration.
struct MockServerConfig {
    greeting: MockResponse,
    helo: MockResponse,
    mail_from: MockResponse,
    rcpt_to: MockResponse,
    rcpt_to_script: Mutex<VecDeque<MockResponse>>,
    rset: MockResponse,
    quit: MockResponse,

    // Failure injection
    response_delay: Option<Duration>,
    hang_on_command: Option<usize>,
}

impl Default for MockServerConfig {
    fn default() -> Self {
        Self {
            greeting: MockResponse::new(220, "mock.example.test ESMTP"),
            helo: MockResponse::new(250, "mock.example.test"),
            mail_from: MockResponse::new(250, "2.1.0 OK"),
            rcpt_to: MockResponse::new(250, "2.1.5 OK"),
            rcpt_to_script: Mutex::new(VecDeque::new()),
            rset: MockResponse::new(250, "2.0.0 OK"),
            quit: MockResponse::new(221, "2.0.0 Bye"),
            response_delay: None,
            hang_on_command: None,
        }
    }
}

/// Mock SMTP exchanger listening on a random loopback port.
pub struct MockSmtpServer {
    addr: SocketAddr,
    commands: Arc<RwLock<Vec<MockCommand>>>,
    gauge: ConnectionGauge,
    shutdown: Arc<AtomicBool>,
}

impl MockSmtpServer {
    /// Creates a builder for configuring the mock server.
    pub fn builder() -> MockSmtpServerBuilder {
        MockSmtpServerBuilder::new()
    }

    /// Starts a mock that accepts every dialogue with default responses.
    pub async fn accepting() -> std::io::Result<Self> {
        Self::builder().build().await
    }

    /// The address the server is listening on.
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// All commands received so far, in arrival order across connections.
    pub async fn commands(&self) -> Vec<MockCommand> {
        self.commands.read().await.clone()
    }

    /// How many `RCPT TO` commands were received.
    pub async fn rcpt_count(&self) -> usize {
        self.commands
            .read()
            .await
            .iter()
            .filter(|command| command.is_rcpt())
            .count()
    }

    /// The connection gauge observing this server.
    pub const fn gauge(&self) -> &ConnectionGauge {
        &self.gauge
    }

    /// Stops accepting new connections.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    async fn handle_client(
        mut stream: TcpStream,
        config: Arc<MockServerConfig>,
        commands: Arc<RwLock<Vec<MockCommand>>>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let (reader, mut writer) = stream.split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();
        let mut handled = 0usize;

        writer.write_all(&config.greeting.to_bytes()).await?;
        writer.flush().await?;

        loop {
            line.clear();

            // Hang instead of reading the Nth command to simulate a stuck
            // server.
            if config.hang_on_command == Some(handled) {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                return Ok(());
            }

            let read = timeout(Duration::from_secs(10), reader.read_line(&mut line)).await;
            let Ok(read) = read else {
                return Ok(());
            };
            if read? == 0 {
                return Ok(());
            }
            handled += 1;

            let command_line = line.trim();
            let mut parts = command_line.splitn(2, ' ');
            let verb = parts.next().unwrap_or("").to_uppercase();
            let argument = parts.next().unwrap_or("").to_string();

            let (response, command) = match verb.as_str() {
                "HELO" => (config.helo.clone(), MockCommand::Helo(argument)),
                "MAIL" => (config.mail_from.clone(), MockCommand::MailFrom(argument)),
                "RCPT" => {
                    let scripted = config.rcpt_to_script.lock().await.pop_front();
                    (
                        scripted.unwrap_or_else(|| config.rcpt_to.clone()),
                        MockCommand::RcptTo(argument),
                    )
                }
                "RSET" => (config.rset.clone(), MockCommand::Rset),
                "QUIT" => {
                    commands.write().await.push(MockCommand::Quit);
                    writer.write_all(&config.quit.to_bytes()).await?;
                    writer.flush().await?;
                    return Ok(());
                }
                _ => (
                    MockResponse::new(500, "Unknown command"),
                    MockCommand::Other(command_line.to_string()),
                ),
            };

            commands.write().await.push(command);

            if let Some(delay) = config.response_delay {
                tokio::time::sleep(delay).await;
            }

            writer.write_all(&response.to_bytes()).await?;
            writer.flush().await?;
        }
    }
}

/// Builder for configuring a [`MockSmtpServer`].
pub struct MockSmtpServerBuilder {
    config: MockServerConfig,
    gauge: Option<ConnectionGauge>,
}

impl MockSmtpServerBuilder {
    fn new() -> Self {
        Self {
            config: MockServerConfig::default(),
            gauge: None,
        }
    }

    /// Sets the greeting response.
    pub fn with_greeting(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.greeting = MockResponse::new(code, message);
        self
    }

    /// Sets a multi-line greeting response.
    pub fn with_greeting_lines(mut self, code: u16, lines: Vec<String>) -> Self {
        self.config.greeting = MockResponse::multi_line(code, lines);
        self
    }

    /// Sets the HELO response.
    pub fn with_helo_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.helo = MockResponse::new(code, message);
        self
    }

    /// Sets the MAIL FROM response.
    pub fn with_mail_from_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.mail_from = MockResponse::new(code, message);
        self
    }

    /// Sets the default RCPT TO response.
    pub fn with_rcpt_to_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.rcpt_to = MockResponse::new(code, message);
        self
    }

    /// Sets a multi-line default RCPT TO response.
    pub fn with_rcpt_to_lines(mut self, code: u16, lines: Vec<String>) -> Self {
        self.config.rcpt_to = MockResponse::multi_line(code, lines);
        self
    }

    /// Queues scripted RCPT TO responses, consumed in order before the
    /// default response applies. The script is shared across connections.
    pub fn with_rcpt_to_script(mut self, responses: Vec<(u16, &str)>) -> Self {
        self.config.rcpt_to_script = Mutex::new(
            responses
                .into_iter()
                .map(|(code, message)| MockResponse::new(code, message))
                .collect(),
        );
        self
    }

    /// Sets the RSET response.
    pub fn with_rset_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.rset = MockResponse::new(code, message);
        self
    }

    /// Sets the QUIT response.
    pub fn with_quit_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.quit = MockResponse::new(code, message);
        self
    }

    /// Adds a delay before every response.
    pub const fn with_response_delay(mut self, delay: Duration) -> Self {
        self.config.response_delay = Some(delay);
        self
    }

    /// Hangs (never responds) instead of reading the Nth command
    /// (0-indexed, per connection).
    pub const fn with_hang_on_command(mut self, command_index: usize) -> Self {
        self.config.hang_on_command = Some(command_index);
        self
    }

    /// Observes connections through a shared gauge instead of a private
    /// one.
    pub fn with_gauge(mut self, gauge: ConnectionGauge) -> Self {
        self.gauge = Some(gauge);
        self
    }

    /// Builds and starts the mock server.
    pub async fn build(self) -> std::io::Result<MockSmtpServer> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let config = Arc::new(self.config);
        let commands = Arc::new(RwLock::new(Vec::new()));
        let gauge = self.gauge.unwrap_or_default();
        let shutdown = Arc::new(AtomicBool::new(false));

        let accept_config = Arc::clone(&config);
        let accept_commands = Arc::clone(&commands);
        let accept_gauge = gauge.clone();
        let accept_shutdown = Arc::clone(&shutdown);

        tokio::spawn(async move {
            loop {
                if accept_shutdown.load(Ordering::Relaxed) {
                    break;
                }

                let accepted = timeout(Duration::from_millis(100), listener.accept()).await;
                if let Ok(Ok((stream, _peer))) = accepted {
                    let config = Arc::clone(&accept_config);
                    let commands = Arc::clone(&accept_commands);
                    let gauge = accept_gauge.clone();

                    tokio::spawn(async move {
                        gauge.connected();
                        if let Err(err) =
                            MockSmtpServer::handle_client(stream, config, commands).await
                        {
                            eprintln!("mock server client error: {err}");
                        }
                        gauge.disconnected();
                    });
                }
            }
        });

        Ok(MockSmtpServer {
            addr,
            commands,
            gauge,
            shutdown,
        })
    }
}
