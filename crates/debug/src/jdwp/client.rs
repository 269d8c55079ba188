// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! The JDWP socket client: command/reply correlation plus the event pump
//! thread.
//!
//! One OS thread owns the read half. Replies are routed to blocked callers
//! by packet id; composite event packets are decoded and posted to the
//! controller's event channel. The pump never issues commands, so it can
//! never deadlock against a caller.

use std::collections::HashMap;
use std::io::Write;
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{mpsc as std_mpsc, Arc};
use std::time::Duration;

use parking_lot::Mutex;

use en_core::{ObjectId, ThreadId};
use tokio::sync::mpsc;

use super::wire::{read_packet, write_command, Cursor, IdSizes, Packet};
use super::{cmd, event_kind, signature_to_name};
use crate::vm::{VmClass, VmEvent, VmLocation};
use crate::DebugError;

const HANDSHAKE: &[u8] = b"JDWP-Handshake";
const REPLY_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) struct JdwpClient {
    writer: Mutex<TcpStream>,
    pending: Arc<Mutex<HashMap<u32, std_mpsc::Sender<Packet>>>>,
    next_id: AtomicU32,
    dead: Arc<AtomicBool>,
    pub id_sizes: IdSizes,
}

impl JdwpClient {
    /// Connect, handshake, negotiate id sizes, and start the pump thread.
    pub fn connect(
        hostname: &str,
        port: u16,
        events: mpsc::Sender<VmEvent>,
    ) -> Result<Self, DebugError> {
        let mut stream = TcpStream::connect((hostname, port))
            .map_err(|e| DebugError::Io(e.to_string()))?;
        stream
            .set_nodelay(true)
            .map_err(|e| DebugError::Io(e.to_string()))?;

        stream
            .write_all(HANDSHAKE)
            .map_err(|e| DebugError::Io(e.to_string()))?;
        let mut ack = [0u8; 14];
        std::io::Read::read_exact(&mut stream, &mut ack)
            .map_err(|e| DebugError::Io(e.to_string()))?;
        if ack != *HANDSHAKE {
            return Err(DebugError::Protocol("handshake rejected".into()));
        }

        // Negotiate id sizes inline, before the pump thread owns the read
        // half. Events arriving first (suspend=y sends VMStart eagerly) are
        // buffered and decoded once the sizes are known.
        const SIZES_ID: u32 = 1;
        write_command(&mut stream, SIZES_ID, (cmd::VM, cmd::VM_ID_SIZES), &[])?;
        let mut queued = Vec::new();
        let id_sizes = loop {
            let packet = read_packet(&mut stream)?;
            if packet.is_reply() && packet.id == SIZES_ID {
                if packet.error != 0 {
                    return Err(DebugError::Command { code: packet.error });
                }
                let mut c = Cursor::new(&packet.data);
                break IdSizes {
                    field: c.i32()? as u8,
                    method: c.i32()? as u8,
                    object: c.i32()? as u8,
                    reference: c.i32()? as u8,
                    frame: c.i32()? as u8,
                };
            }
            if !packet.is_reply() {
                queued.push(packet);
            }
        };

        let writer = stream
            .try_clone()
            .map_err(|e| DebugError::Io(e.to_string()))?;
        let pending: Arc<Mutex<HashMap<u32, std_mpsc::Sender<Packet>>>> = Arc::default();
        let dead = Arc::new(AtomicBool::new(false));

        for packet in queued {
            dispatch_event(&packet, id_sizes, &events);
        }
        spawn_pump(stream, Arc::clone(&pending), Arc::clone(&dead), id_sizes, events)?;

        Ok(Self {
            writer: Mutex::new(writer),
            pending,
            next_id: AtomicU32::new(SIZES_ID + 1),
            dead,
            id_sizes,
        })
    }

    /// Send one command and block for its reply.
    pub fn command(&self, command: (u8, u8), payload: &[u8]) -> Result<Vec<u8>, DebugError> {
        if self.dead.load(Ordering::Acquire) {
            return Err(DebugError::Disconnected);
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = std_mpsc::channel();
        self.pending.lock().insert(id, tx);

        {
            let mut writer = self.writer.lock();
            write_command(&mut *writer, id, command, payload)?;
        }

        let packet = rx.recv_timeout(REPLY_TIMEOUT).map_err(|_| {
            self.pending.lock().remove(&id);
            if self.dead.load(Ordering::Acquire) {
                DebugError::Disconnected
            } else {
                DebugError::Protocol(format!("no reply to command {:?}", command))
            }
        })?;
        if packet.error != 0 {
            return Err(DebugError::Command { code: packet.error });
        }
        Ok(packet.data)
    }
}

fn spawn_pump(
    mut stream: TcpStream,
    pending: Arc<Mutex<HashMap<u32, std_mpsc::Sender<Packet>>>>,
    dead: Arc<AtomicBool>,
    id_sizes: IdSizes,
    events: mpsc::Sender<VmEvent>,
) -> Result<(), DebugError> {
    std::thread::Builder::new()
        .name("jdwp-pump".into())
        .spawn(move || {
            loop {
                let packet = match read_packet(&mut stream) {
                    Ok(packet) => packet,
                    Err(_) => break,
                };
                if packet.is_reply() {
                    let waiter = pending.lock().remove(&packet.id);
                    if let Some(waiter) = waiter {
                        let _ = waiter.send(packet);
                    }
                } else {
                    dispatch_event(&packet, id_sizes, &events);
                }
            }
            dead.store(true, Ordering::Release);
            // Unblock callers waiting on replies that will never come.
            pending.lock().clear();
            let _ = events.blocking_send(VmEvent::VmDisconnected);
            tracing::debug!("jdwp pump thread exited");
        })
        .map_err(|e| DebugError::Io(e.to_string()))?;
    Ok(())
}

fn dispatch_event(packet: &Packet, id_sizes: IdSizes, events: &mpsc::Sender<VmEvent>) {
    if packet.command != (cmd::EVENT, cmd::EVENT_COMPOSITE) {
        tracing::debug!(command = ?packet.command, "ignoring unsolicited packet");
        return;
    }
    match decode_composite(&packet.data, id_sizes) {
        Ok(decoded) => {
            for event in decoded {
                if events.blocking_send(event).is_err() {
                    return;
                }
            }
        }
        Err(e) => tracing::warn!("undecodable composite event: {}", e),
    }
}

/// Decode one composite event packet into pump events.
fn decode_composite(data: &[u8], sizes: IdSizes) -> Result<Vec<VmEvent>, DebugError> {
    let mut c = Cursor::new(data);
    let _suspend_policy = c.u8()?;
    let count = c.u32()?;
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let kind = c.u8()?;
        let _request_id = c.u32()?;
        match kind {
            event_kind::VM_START => {
                let _thread = c.id(sizes.object)?;
                out.push(VmEvent::VmStart);
            }
            event_kind::VM_DEATH => out.push(VmEvent::VmDeath),
            event_kind::SINGLE_STEP | event_kind::BREAKPOINT => {
                let thread = ThreadId(c.id(sizes.object)?);
                let location = read_location(&mut c, sizes)?;
                out.push(if kind == event_kind::BREAKPOINT {
                    VmEvent::Breakpoint { thread, location }
                } else {
                    VmEvent::Step { thread, location }
                });
            }
            event_kind::EXCEPTION => {
                let thread = ThreadId(c.id(sizes.object)?);
                let _throw_location = read_location(&mut c, sizes)?;
                let _tag = c.u8()?;
                let exception = ObjectId(c.id(sizes.object)?);
                let catch_location = read_location(&mut c, sizes)?;
                out.push(VmEvent::Exception { thread, exception, catch_location });
            }
            event_kind::THREAD_START => {
                out.push(VmEvent::ThreadStart { thread: ThreadId(c.id(sizes.object)?) });
            }
            event_kind::THREAD_DEATH => {
                out.push(VmEvent::ThreadDeath { thread: ThreadId(c.id(sizes.object)?) });
            }
            event_kind::CLASS_PREPARE => {
                let _thread = c.id(sizes.object)?;
                let _ref_type_tag = c.u8()?;
                let ref_id = c.id(sizes.reference)?;
                let signature = c.string()?;
                let _status = c.u32()?;
                out.push(VmEvent::ClassPrepare {
                    class: VmClass {
                        ref_id,
                        name: signature_to_name(&signature),
                        // Fetched by the controller off the pump thread;
                        // issuing commands here would deadlock the pump.
                        source_name: None,
                    },
                });
            }
            other => {
                // Event kinds we never requested; the remainder of the
                // packet cannot be skipped reliably, so stop here.
                tracing::debug!(kind = other, "unhandled event kind, dropping rest of packet");
                break;
            }
        }
    }
    Ok(out)
}

/// A JDWP location; `None` when the class id is zero (null location).
fn read_location(c: &mut Cursor<'_>, sizes: IdSizes) -> Result<Option<VmLocation>, DebugError> {
    let _type_tag = c.u8()?;
    let class_id = c.id(sizes.reference)?;
    let method_id = c.id(sizes.method)?;
    let code_index = c.u64()?;
    if class_id == 0 {
        return Ok(None);
    }
    // Source names and lines require reference-type lookups the pump must
    // not perform; the controller resolves them from the raw location.
    Ok(Some(VmLocation {
        class_id,
        method_id,
        code_index,
        source_path: String::new(),
        source_name: String::new(),
        line: 0,
    }))
}
