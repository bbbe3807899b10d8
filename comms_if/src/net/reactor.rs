//! Single-threaded socket reactor

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info, warn};
use serde::Deserialize;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::{
    collections::BTreeMap,
    fmt::Debug,
    io,
    net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc
    },
    thread,
    time::{Duration, Instant}
};
use thiserror::Error;

use super::conn::{ConnError, ConnId, Connection};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Receives the events of a [`Reactor`].
///
/// Every callback is given the reactor back so that it can send on, close or open links, or stop
/// the loop.
pub trait LinkHandler<T> {
    /// A link was accepted on a listener or an outbound dial succeeded.
    fn on_connect(&mut self, _reactor: &mut Reactor<T>, _conn: ConnId, _tag: T) {}

    /// A complete line was received on a link.
    fn on_line(&mut self, reactor: &mut Reactor<T>, conn: ConnId, tag: T, line: &str);

    /// A link was closed, either by the peer, by an error or locally.
    fn on_close(&mut self, _reactor: &mut Reactor<T>, _conn: ConnId, _tag: T, _reason: &ConnError) {}

    /// An outbound dial failed.
    fn on_dial_failed(&mut self, _reactor: &mut Reactor<T>, _tag: T, _addr: &str, _error: &io::Error) {}
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the reactor.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReactorParams {
    /// Time an outbound dial may stay in progress before it fails, in milliseconds
    pub connect_timeout_ms: u64,

    /// Sleep between loop iterations which found no work to do, in milliseconds
    pub idle_sleep_ms: u64,

    /// Longest line accepted before a link is considered unframed and closed
    pub max_line_len: usize,

    /// Most output, in bytes, that may wait on a link. A link whose peer falls further behind is
    /// closed.
    pub max_send_buf: usize,

    /// Timeout of the final flush of each link when the reactor stops, in milliseconds
    pub shutdown_flush_timeout_ms: u64
}

/// Owns every socket of the process and drives them from a single thread.
pub struct Reactor<T> {
    params: ReactorParams,
    listeners: Vec<Listener<T>>,
    conns: BTreeMap<ConnId, Connection<T>>,
    dials: Vec<Dial<T>>,
    connecting: Vec<PendingDial<T>>,
    next_id: u64,
    running: bool,
    run_flag: Option<Arc<AtomicBool>>,
    scratch: Vec<u8>
}

struct Listener<T> {
    listener: TcpListener,
    tag: T,
    addr: SocketAddr
}

/// A queued outbound link.
struct Dial<T> {
    addr: String,
    tag: T,
    reconnect: Option<Duration>,
    due: Instant
}

/// An outbound link whose non-blocking connect is in progress.
struct PendingDial<T> {
    dial: Dial<T>,
    socket: Socket,

    /// Resolved addresses still to try if this one fails, last first
    remaining: Vec<SocketAddr>,

    started: Instant
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ReactorError {
    #[error("Could not bind a listener to {0}: {1}")]
    BindError(String, io::Error),

    #[error("No open link with ID {0}")]
    NoSuchConnection(ConnId),

    #[error("Output of link {0} is backed up, the link will be closed")]
    SendBufferFull(ConnId)
}

enum Event<T> {
    Connected(ConnId, T),
    Line(ConnId, T, String),
    Closed(ConnId, T, ConnError),
    DialFailed(T, String, io::Error)
}

enum DialProgress {
    Pending,
    Connected,
    Failed(io::Error)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ReactorParams {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 1000,
            idle_sleep_ms: 1,
            max_line_len: 64 * 1024,
            max_send_buf: 1024 * 1024,
            shutdown_flush_timeout_ms: 100
        }
    }
}

impl<T> Reactor<T>
where
    T: Copy + Eq + Debug
{
    const READ_CHUNK_SIZE: usize = 4096;

    pub fn new(params: ReactorParams) -> Self {
        Self {
            params,
            listeners: Vec::new(),
            conns: BTreeMap::new(),
            dials: Vec::new(),
            connecting: Vec::new(),
            next_id: 0,
            running: true,
            run_flag: None,
            scratch: vec![0u8; Self::READ_CHUNK_SIZE]
        }
    }

    /// Attach an external run flag, the loop stops once the flag is cleared.
    pub fn set_run_flag(&mut self, flag: Arc<AtomicBool>) {
        self.run_flag = Some(flag);
    }

    /// Bind a listening socket, returning its local address.
    pub fn listen<A>(&mut self, addr: A, tag: T) -> Result<SocketAddr, ReactorError>
    where
        A: ToSocketAddrs + Debug
    {
        let bind_err = |e| ReactorError::BindError(format!("{:?}", addr), e);

        let listener = TcpListener::bind(&addr).map_err(bind_err)?;
        listener.set_nonblocking(true).map_err(bind_err)?;
        let local = listener.local_addr().map_err(bind_err)?;

        info!("Listening for {:?} links on {}", tag, local);

        self.listeners.push(Listener {
            listener,
            tag,
            addr: local
        });

        Ok(local)
    }

    /// Queue an outbound link, dialled on the next loop iteration.
    ///
    /// The dial never blocks the loop: the connect is started and then polled on each iteration
    /// until it completes, fails or times out.
    ///
    /// If `reconnect` is set the link is redialled after that delay whenever the dial fails or
    /// the link drops, unless it was closed locally.
    pub fn connect(&mut self, addr: &str, tag: T, reconnect: Option<Duration>) {
        self.dials.push(Dial {
            addr: addr.to_string(),
            tag,
            reconnect,
            due: Instant::now()
        });
    }

    /// Queue a line for sending on the given link.
    ///
    /// If the link's peer has fallen too far behind the line is refused and the link is closed
    /// with [`ConnError::SendBufferFull`] on the next iteration.
    pub fn send_line(&mut self, conn: ConnId, line: &str) -> Result<(), ReactorError> {
        match self.conns.get_mut(&conn) {
            Some(c) if c.accepts_output() => c.queue_line(line)
                .map_err(|_| ReactorError::SendBufferFull(conn)),
            _ => Err(ReactorError::NoSuchConnection(conn))
        }
    }

    /// Queue a line on every open link with the given tag, returning how many links it was
    /// queued on. Links which are backed up are skipped and closed.
    pub fn broadcast(&mut self, tag: T, line: &str) -> usize {
        let mut num = 0;

        for c in self.conns.values_mut().filter(|c| c.tag == tag && c.accepts_output()) {
            match c.queue_line(line) {
                Ok(()) => num += 1,
                Err(e) => warn!("Dropping {:?} link {}: {}", c.tag, c.id, e)
            }
        }

        num
    }

    /// Close a link once its pending output has been written.
    pub fn close(&mut self, conn: ConnId) -> Result<(), ReactorError> {
        match self.conns.get_mut(&conn) {
            Some(c) => {
                c.closing = true;
                Ok(())
            },
            None => Err(ReactorError::NoSuchConnection(conn))
        }
    }

    /// Stop the loop at the end of the current iteration.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Open links with the given tag.
    pub fn connections(&self, tag: T) -> Vec<ConnId> {
        self.conns
            .values()
            .filter(|c| c.tag == tag && c.accepts_output())
            .map(|c| c.id)
            .collect()
    }

    pub fn num_connections(&self, tag: T) -> usize {
        self.connections(tag).len()
    }

    /// Run the loop until stopped, then flush and close every link.
    pub fn run<H>(&mut self, handler: &mut H)
    where
        H: LinkHandler<T>
    {
        let idle_sleep = Duration::from_millis(self.params.idle_sleep_ms);

        while self.is_running() {
            if !self.run_once(handler) {
                thread::sleep(idle_sleep);
            }
        }

        self.shutdown();
    }

    /// Run a single iteration of the loop.
    ///
    /// Returns true if any socket activity took place.
    pub fn run_once<H>(&mut self, handler: &mut H) -> bool
    where
        H: LinkHandler<T>
    {
        if let Some(ref flag) = self.run_flag {
            if !flag.load(Ordering::Relaxed) {
                info!("Run flag cleared, stopping");
                self.running = false;
            }
        }

        if !self.running {
            return false
        }

        let mut events = Vec::new();
        let mut did_work = false;

        did_work |= self.dial_due(&mut events);
        did_work |= self.poll_connecting(&mut events);
        did_work |= self.accept_pending(&mut events);
        did_work |= self.service_links(&mut events);

        for event in events {
            match event {
                Event::Connected(id, tag) => handler.on_connect(self, id, tag),
                Event::Line(id, tag, line) => handler.on_line(self, id, tag, &line),
                Event::Closed(id, tag, reason) => handler.on_close(self, id, tag, &reason),
                Event::DialFailed(tag, addr, err) => {
                    handler.on_dial_failed(self, tag, &addr, &err)
                }
            }
        }

        did_work
    }

    /// Flush and close every link and drop every listener.
    pub fn shutdown(&mut self) {
        let timeout = Duration::from_millis(self.params.shutdown_flush_timeout_ms);

        for (_, mut c) in std::mem::take(&mut self.conns) {
            c.flush_and_shutdown(timeout);
        }

        self.listeners.clear();
        self.dials.clear();
        self.connecting.clear();
        self.running = false;
    }

    // --------------------------------------------------------------------------------------------
    // PRIVATE
    // --------------------------------------------------------------------------------------------

    fn alloc_id(&mut self) -> ConnId {
        let id = ConnId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Start the connects of every dial which is due.
    fn dial_due(&mut self, events: &mut Vec<Event<T>>) -> bool {
        let now = Instant::now();
        let (due, pending): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.dials).into_iter().partition(|d| d.due <= now);
        self.dials = pending;

        let did_work = !due.is_empty();

        for dial in due {
            match dial.addr.to_socket_addrs() {
                Ok(addrs) => {
                    let mut addrs: Vec<SocketAddr> = addrs.collect();
                    addrs.reverse();
                    self.start_dial(dial, addrs, events);
                },
                Err(e) => self.dial_failed(dial, e, events)
            }
        }

        did_work
    }

    /// Start a connect to the next remaining address of a dial.
    fn start_dial(&mut self, dial: Dial<T>, mut remaining: Vec<SocketAddr>, events: &mut Vec<Event<T>>) {
        let mut last_err = io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("{} resolved to no addresses", dial.addr)
        );

        while let Some(addr) = remaining.pop() {
            match start_connect(addr) {
                Ok(socket) => {
                    debug!("Dialling {:?} link to {}", dial.tag, addr);
                    self.connecting.push(PendingDial {
                        dial,
                        socket,
                        remaining,
                        started: Instant::now()
                    });
                    return
                },
                Err(e) => last_err = e
            }
        }

        self.dial_failed(dial, last_err, events);
    }

    /// Check the progress of every connect in flight.
    fn poll_connecting(&mut self, events: &mut Vec<Event<T>>) -> bool {
        let timeout = Duration::from_millis(self.params.connect_timeout_ms);
        let mut did_work = false;

        for pending in std::mem::take(&mut self.connecting) {
            match connect_progress(&pending.socket, pending.started, timeout) {
                DialProgress::Pending => self.connecting.push(pending),
                DialProgress::Connected => {
                    did_work = true;
                    self.dial_complete(pending.dial, pending.socket.into(), events);
                },
                DialProgress::Failed(e) => {
                    did_work = true;

                    if pending.remaining.is_empty() {
                        self.dial_failed(pending.dial, e, events);
                    }
                    else {
                        debug!("Dial of {} failed, trying the next address: {}", pending.dial.addr, e);
                        self.start_dial(pending.dial, pending.remaining, events);
                    }
                }
            }
        }

        did_work
    }

    fn dial_complete(&mut self, dial: Dial<T>, stream: TcpStream, events: &mut Vec<Event<T>>) {
        let id = self.alloc_id();

        let conn = Connection::new(
            id,
            dial.tag,
            stream,
            Some(dial.addr.clone()),
            dial.reconnect,
            self.params.max_line_len,
            self.params.max_send_buf
        );

        match conn {
            Ok(conn) => {
                info!("Connected {:?} link {} to {}", dial.tag, id, dial.addr);
                events.push(Event::Connected(id, dial.tag));
                self.conns.insert(id, conn);
            },
            Err(e) => self.dial_failed(dial, e, events)
        }
    }

    fn dial_failed(&mut self, dial: Dial<T>, e: io::Error, events: &mut Vec<Event<T>>) {
        warn!("Could not connect {:?} link to {}: {}", dial.tag, dial.addr, e);

        if let Some(delay) = dial.reconnect {
            self.dials.push(Dial {
                addr: dial.addr.clone(),
                due: Instant::now() + delay,
                ..dial
            });
        }
        events.push(Event::DialFailed(dial.tag, dial.addr, e));
    }

    fn accept_pending(&mut self, events: &mut Vec<Event<T>>) -> bool {
        let mut accepted = Vec::new();

        // One accept per listener per iteration
        for l in self.listeners.iter() {
            match l.listener.accept() {
                Ok((stream, peer)) => accepted.push((l.tag, stream, peer)),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => (),
                Err(e) => warn!("Accept failed on {:?} listener {}: {}", l.tag, l.addr, e)
            }
        }

        let did_work = !accepted.is_empty();

        for (tag, stream, peer) in accepted {
            let id = self.alloc_id();
            let conn = Connection::new(
                id,
                tag,
                stream,
                None,
                None,
                self.params.max_line_len,
                self.params.max_send_buf
            );

            match conn {
                Ok(conn) => {
                    info!("Accepted {:?} link {} from {}", tag, id, peer);
                    self.conns.insert(id, conn);
                    events.push(Event::Connected(id, tag));
                },
                Err(e) => warn!("Could not configure {:?} link from {}: {}", tag, peer, e)
            }
        }

        did_work
    }

    fn service_links(&mut self, events: &mut Vec<Event<T>>) -> bool {
        let mut did_work = false;
        let mut closed = Vec::new();

        for c in self.conns.values_mut() {
            if c.overflowed {
                closed.push((c.id, ConnError::SendBufferFull(self.params.max_send_buf)));
                continue
            }

            let mut result = Ok(());

            if !c.closing {
                match c.read_once(&mut self.scratch) {
                    Ok(Some(lines)) => {
                        did_work = true;
                        for line in lines {
                            events.push(Event::Line(c.id, c.tag, line));
                        }
                    },
                    Ok(None) => (),
                    Err(e) => result = Err(e)
                }
            }

            if result.is_ok() {
                match c.flush_once() {
                    Ok(wrote) => did_work |= wrote,
                    Err(e) => result = Err(e)
                }
            }

            if let Err(e) = result {
                closed.push((c.id, e));
            }
            else if c.ready_to_close() {
                closed.push((c.id, ConnError::LocalClose));
            }
        }

        for (id, reason) in closed {
            let mut conn = match self.conns.remove(&id) {
                Some(c) => c,
                None => continue
            };
            did_work = true;

            debug!("Closing {:?} link {}: {}", conn.tag, id, reason);

            let local = matches!(reason, ConnError::LocalClose);
            if let (false, Some(addr), Some(delay)) = (local, &conn.dial_addr, conn.reconnect) {
                info!("Redialling {:?} link to {} in {:?}", conn.tag, addr, delay);
                self.dials.push(Dial {
                    addr: addr.clone(),
                    tag: conn.tag,
                    reconnect: conn.reconnect,
                    due: Instant::now() + delay
                });
            }

            // Local closes have already written their output, the others cannot
            conn.shutdown();
            events.push(Event::Closed(id, conn.tag, reason));
        }

        did_work
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Start a non-blocking connect to the given address.
fn start_connect(addr: SocketAddr) -> io::Result<Socket> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_nonblocking(true)?;

    match socket.connect(&SockAddr::from(addr)) {
        Ok(()) => Ok(socket),
        Err(e) if connect_in_progress(&e) => Ok(socket),
        Err(e) => Err(e)
    }
}

/// Poll a connect started by [`start_connect`].
fn connect_progress(socket: &Socket, started: Instant, timeout: Duration) -> DialProgress {
    match socket.take_error() {
        Ok(Some(e)) | Err(e) => return DialProgress::Failed(e),
        Ok(None) => ()
    }

    // The peer address is only known once the handshake has completed
    if socket.peer_addr().is_ok() {
        DialProgress::Connected
    }
    else if started.elapsed() >= timeout {
        DialProgress::Failed(io::Error::new(io::ErrorKind::TimedOut, "connection timed out"))
    }
    else {
        DialProgress::Pending
    }
}

fn connect_in_progress(e: &io::Error) -> bool {
    #[cfg(unix)]
    {
        if e.raw_os_error() == Some(libc::EINPROGRESS) {
            return true
        }
    }

    e.kind() == io::ErrorKind::WouldBlock
}
