//! Runs two links against each other over a simulated lossy serial line.
//!
//! # Usage
//!
//! One side plays the command station and issues locomotive speed commands, the other side plays
//! the booster that executes them. Commands for the same locomotive replace each other while they
//! wait in the send queue, so a congested line only delays the newest speed.
//!
//!   > $ cargo run --example link_pair -- --loss 2 --millis 20000
//!
//! Every delivered command is printed with the simulated time, followed by the counters of both
//! sides. Build with `--features log` and set `RUST_LOG=debug` to also see the protocol trace.
use std::io::{stdout, Write};
use structopt::StructOpt;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use ltp::link::{Application, Config as LinkConfig, Link, LinkState, Stats};
use ltp::serial::{transfer_lossy, PrngLoss, Ring};
use ltp::wire::Channel;

const SPEED: u8 = 0x10;

type State = LinkState<CriticalSectionRawMutex, 16>;
type Line = Ring<256>;

fn main() {
    env_logger::init();

    let Config {
        loss,
        millis,
        interval,
        locos,
        seed,
        link_control,
    } = Config::from_args();

    let config = LinkConfig { link_control, ..LinkConfig::default() };
    let station = State::new(LinkConfig { id: 1, ..config })
        .expect("Invalid link configuration");
    let booster = State::new(LinkConfig { id: 2, ..config })
        .expect("Invalid link configuration");

    let mut station_link = Link::new(&station);
    let mut booster_link = Link::new(&booster);
    let (mut station_rx, mut station_tx) = (Line::new(), Line::new());
    let (mut booster_rx, mut booster_tx) = (Line::new(), Line::new());
    let mut wire_loss = PrngLoss::percent(loss, seed);

    let channel = Channel::new(1).expect("Channel 1 is an application channel");
    let out = stdout();
    let mut out = out.lock();
    let mut station_app = Printer { side: "station", now: 0, received: 0 };
    let mut booster_app = Printer { side: "booster", now: 0, received: 0 };
    let mut issued = 0u32;

    for now in 0..millis {
        station.tick();
        booster.tick();
        station_app.now = now;
        booster_app.now = now;

        if now % interval.max(1) == 0 && station.is_active() {
            let addr = (issued % u32::from(locos.max(1))) as u8 + 1;
            let speed = (issued / u32::from(locos.max(1)) % 128) as u8;
            let command = [SPEED, addr, speed, 1];
            match station.send_replacing(channel, &command, |queued| {
                queued.len() > 1 && queued[0] == SPEED && queued[1] == addr
            }) {
                Ok(()) => issued += 1,
                Err(err) => writeln!(out, "{:>7} station: command refused: {}", now, err).unwrap(),
            }
        }

        station_link.poll(&mut station_rx, &mut station_tx, &mut station_app);
        booster_link.poll(&mut booster_rx, &mut booster_tx, &mut booster_app);
        transfer_lossy(&mut station_tx, &mut booster_rx, &mut wire_loss);
        transfer_lossy(&mut booster_tx, &mut station_rx, &mut wire_loss);
    }

    writeln!(out, "issued {} commands, {} executed", issued, booster_app.received).unwrap();
    print_stats(&mut out, "station", &station.stats());
    print_stats(&mut out, "booster", &booster.stats());
}

struct Printer {
    side: &'static str,
    now: u32,
    received: u32,
}

impl Application for Printer {
    fn packet_received(&mut self, channel: Channel, payload: &[u8]) {
        self.received += 1;
        match payload {
            [SPEED, addr, speed, forward] => println!("{:>7} {}: {} loco {} speed {} {}",
                self.now, self.side, channel, addr, speed, if *forward != 0 { "fwd" } else { "rev" }),
            other => println!("{:>7} {}: {} {:02x?}", self.now, self.side, channel, other),
        }
    }

    fn link_active(&mut self) {
        println!("{:>7} {}: link active", self.now, self.side);
    }

    fn link_reset(&mut self) {
        println!("{:>7} {}: link reset", self.now, self.side);
    }
}

fn print_stats(out: &mut impl Write, side: &str, stats: &Stats) {
    writeln!(out, "{}: {:#?}", side, stats).unwrap();
}

#[derive(StructOpt)]
struct Config {
    /// Percentage of octets lost on the line.
    #[structopt(long, default_value = "0")]
    loss: u8,
    /// Simulated run time in milliseconds.
    #[structopt(long, default_value = "10000")]
    millis: u32,
    /// Milliseconds between speed commands.
    #[structopt(long, default_value = "5")]
    interval: u32,
    /// Number of locomotives the commands rotate through.
    #[structopt(long, default_value = "4")]
    locos: u8,
    /// Seed of the loss simulation.
    #[structopt(long, default_value = "1")]
    seed: u64,
    /// Negotiate windows and payload sizes on channel 0.
    #[structopt(long)]
    link_control: bool,
}
