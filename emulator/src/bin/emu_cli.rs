use std::collections::VecDeque;
use std::io::{Write, stdout};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::error::Result;
use common::mem::Memory;
use common::misc::words_from_bytes;
use emu_lib::cpu::{AnyCpu, Cpu};
use emu_lib::debugger::Breakpoint;
use emu_lib::driver::{
    Driver, DriverConfig, FrameGovernor, Governor, Input, InputRequest, Screen, State, Unpaced,
};
use emu_lib::io::console::{Console, ConsolePorts, LmcConsole, StdIo};
use emu_lib::io::cpm::CpmSession;
use emu_lib::{I8080, Lmc, Lr35902, Synacor, Z80, i8080, lmc, lr35902, synacor};

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEventKind};
use crossterm::terminal;
use log::{error, info};

// Where the 8080 and Z80 machines find the console.
const CONSOLE_STATUS_PORT: u8 = 0x00;
const CONSOLE_DATA_PORT: u8 = 0x01;

const TICKS_PER_SECOND: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Isa {
    I8080,
    Z80,
    Lr35902,
    Lmc,
    Synacor,
}

/// 8-bit CPU Emulator
#[derive(Parser)]
struct Args {
    /// Binary to execute
    bin: String,

    /// Instruction set of the binary
    #[arg(long, value_enum)]
    isa: Isa,

    /// Run as a CP/M program (8080 and Z80 only)
    #[arg(long)]
    cpm: bool,

    /// Address at which to load the binary
    #[arg(long, value_parser = parse_number, default_value = "0")]
    load: u16,

    /// Address at which to start executing; defaults to the load address
    #[arg(long, value_parser = parse_number)]
    start: Option<u16>,

    /// Clock cycles run per tick
    #[arg(long, default_value_t = 33_333)]
    cycles_per_tick: u64,

    /// Byte supplied with the interrupt requested at the end of each tick
    #[arg(long, value_parser = parse_byte)]
    interrupt: Option<u8>,

    /// Breakpoint address, or a line copied from the disassembler
    #[arg(long = "break")]
    breakpoints: Vec<String>,

    /// Stop at breakpoints
    #[arg(long)]
    debug: bool,

    /// Take debugger keys from the terminal: q quits, p pauses, s steps an
    /// instruction, t runs out the tick, c continues
    #[arg(long)]
    interactive: bool,
}

impl Args {
    // Range checks that depend on the instruction set.
    fn check(&self) -> std::result::Result<(), String> {
        if self.isa == Isa::Lmc {
            let cells = lmc::MEMORY_SIZE as u16;
            for (name, addr) in [("--load", Some(self.load)), ("--start", self.start)] {
                if let Some(addr) = addr.filter(|&addr| addr >= cells) {
                    return Err(format!("{name} {addr} is past the LMC's {cells} mailboxes"));
                }
            }
        }
        Ok(())
    }
}

fn parse_number(s: &str) -> std::result::Result<u16, String> {
    match s.strip_prefix("0x") {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    }
    .map_err(|e| format!("{s:?}: {e}"))
}

fn parse_byte(s: &str) -> std::result::Result<u8, String> {
    let val = parse_number(s)?;
    u8::try_from(val).map_err(|_| format!("{s:?} doesn't fit in a byte"))
}

////////////////////////////////////////////////////////////////////////////////

// The terminal console used with --interactive: output goes to stdout, and
// keys the debugger doesn't claim are queued as input.
#[derive(Default)]
struct KeyConsole {
    in_buf: Mutex<VecDeque<u8>>,
}

impl Console for KeyConsole {
    fn handle_output(&self, val: u8) {
        let mut out = stdout().lock();
        if val == b'\n' {
            // Raw mode doesn't return the carriage.
            let _ = out.write_all(b"\r");
        }
        let _ = out.write_all(&[val]).and_then(|_| out.flush());
    }

    fn input_available(&self) -> bool {
        !self.in_buf.lock().unwrap().is_empty()
    }

    fn poll_input(&self) -> Option<u8> {
        self.in_buf.lock().unwrap().pop_front()
    }
}

struct KeyInput {
    console: Arc<KeyConsole>,
}

impl KeyInput {
    fn poll(&mut self, request: &mut InputRequest, debug_only: bool) -> Result<()> {
        while event::poll(Duration::ZERO).unwrap_or(false) {
            let Ok(TermEvent::Key(key)) = event::read() else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => request.quit = true,
                KeyCode::Char('p') => request.toggle_pause = true,
                KeyCode::Char('s') => request.step_instruction = true,
                KeyCode::Char('t') => request.step_cycle = true,
                KeyCode::Char('c') => request.continue_running = true,
                KeyCode::Char(ch) if !debug_only && ch.is_ascii() => {
                    self.console.in_buf.lock().unwrap().push_back(ch as u8)
                }
                KeyCode::Enter if !debug_only => {
                    self.console.in_buf.lock().unwrap().push_back(b'\n')
                }
                _ => (),
            }
        }
        Ok(())
    }
}

impl Input for KeyInput {
    fn read(&mut self, request: &mut InputRequest) -> Result<()> {
        self.poll(request, false)
    }

    fn read_debug_only(&mut self, request: &mut InputRequest) -> Result<()> {
        self.poll(request, true)
    }
}

// Without a terminal to drive it, a breakpoint dumps the registers once and
// carries on.
#[derive(Default)]
struct AutoContinue {
    dumped: bool,
}

impl Input for AutoContinue {
    fn read(&mut self, _request: &mut InputRequest) -> Result<()> {
        Ok(())
    }

    fn read_debug_only(&mut self, request: &mut InputRequest) -> Result<()> {
        if std::mem::take(&mut self.dumped) {
            request.continue_running = true;
        } else {
            self.dumped = true;
            request.step_instruction = true;
        }
        Ok(())
    }
}

#[derive(Default)]
struct StatusScreen {
    last_state: Option<State>,
}

impl<C: Cpu> Screen<C> for StatusScreen {
    fn update_screen(&mut self, cpu: &C, state: State) {
        if self.last_state != Some(state) {
            if self.last_state.is_some() {
                info!("{state} at {:#06x}", cpu.pc());
            }
            self.last_state = Some(state);
        }
    }

    fn update_debug_only(&mut self, cpu: &C) {
        let regs: Vec<String> =
            cpu.register_snapshot().iter().map(|(name, val)| format!("{name}={val:#06x}")).collect();
        let flags: String = cpu
            .flag_snapshot()
            .iter()
            .map(|(name, set)| if *set { name.to_uppercase() } else { name.to_string() })
            .collect::<Vec<_>>()
            .join(" ");
        eprint!("{} [{flags}]\r\n", regs.join(" "));
    }
}

////////////////////////////////////////////////////////////////////////////////

fn build_cpu(args: &Args, bin: &[u8], console: Arc<dyn Console>) -> AnyCpu {
    let start = args.start.unwrap_or(args.load);
    match args.isa {
        Isa::I8080 | Isa::Z80 => {
            let mut mem = Memory::with_size(i8080::MEMORY_SIZE);
            mem.load(bin, args.load);
            let ports = Arc::new(Mutex::new(ConsolePorts::new(
                console,
                CONSOLE_DATA_PORT,
                Some(CONSOLE_STATUS_PORT),
            )));
            if args.isa == Isa::I8080 {
                let mut cpu = I8080::new(mem, start);
                cpu.add_io_observer(ports);
                AnyCpu::I8080(cpu)
            } else {
                let mut cpu = Z80::new(mem, start);
                cpu.add_io_observer(ports);
                AnyCpu::Z80(cpu)
            }
        }
        Isa::Lr35902 => {
            let mut mem = Memory::with_size(lr35902::MEMORY_SIZE);
            mem.load(bin, args.load);
            let mut cpu = Lr35902::new(mem);
            if let Some(start) = args.start {
                cpu.regs_mut().pc = start;
            }
            AnyCpu::Lr35902(cpu)
        }
        Isa::Lmc => {
            let mut mem = Memory::with_size(lmc::MEMORY_SIZE);
            mem.load(&words_from_bytes(bin), args.load as u8);
            let mut cpu = Lmc::new(mem, start as u8);
            cpu.add_io_observer(Arc::new(Mutex::new(LmcConsole::new(console))));
            AnyCpu::Lmc(cpu)
        }
        Isa::Synacor => {
            let mut mem = Memory::with_size(synacor::MEMORY_SIZE);
            mem.load(&words_from_bytes(bin), args.load);
            let mut cpu = Synacor::new(mem, start);
            let ports = ConsolePorts::new(console, synacor::CONSOLE_PORT, None);
            cpu.add_io_observer(Arc::new(Mutex::new(ports)));
            AnyCpu::Synacor(cpu)
        }
    }
}

fn drive<G: Governor, I: Input, S: Screen<AnyCpu>>(
    args: &Args,
    cpu: AnyCpu,
    governor: G,
    input: I,
    screen: S,
) -> Result<()> {
    let config = DriverConfig {
        cycles_per_tick: args.cycles_per_tick,
        interrupt_byte: args.interrupt,
        run_once: true,
        debug_mode: args.debug,
    };
    let mut driver = Driver::new(cpu, governor, input, screen, config);
    {
        let debugger = driver.debugger();
        let mut debugger = debugger.lock().unwrap();
        for line in args.breakpoints.iter() {
            debugger.add_breakpoint(Breakpoint::from_line(line, 16)?);
        }
    }
    driver.run()?;
    info!("Stopped after {} cycles at {:#06x}", driver.total_cycles(), driver.cpu().pc());
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let bin = std::fs::read(&args.bin).unwrap_or_else(|err| {
        error!("Unable to read {}: {err}", args.bin);
        std::process::exit(1);
    });

    if args.cpm {
        let console: Arc<dyn Console> = Arc::new(StdIo::new());
        return match args.isa {
            Isa::I8080 => CpmSession::i8080(&bin, console).run(),
            Isa::Z80 => CpmSession::z80(&bin, console).run(),
            isa => {
                error!("CP/M needs an 8080 or a Z80, not {isa:?}");
                std::process::exit(2);
            }
        };
    }

    if args.interactive {
        let console = Arc::new(KeyConsole::default());
        let cpu = build_cpu(args, &bin, console.clone());
        let input = KeyInput { console };
        let _ = terminal::enable_raw_mode();
        let ret = drive(args, cpu, FrameGovernor::new(TICKS_PER_SECOND), input, StatusScreen::default());
        let _ = terminal::disable_raw_mode();
        ret
    } else {
        let cpu = build_cpu(args, &bin, Arc::new(StdIo::new()));
        drive(args, cpu, Unpaced, AutoContinue::default(), StatusScreen::default())
    }
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    if let Err(msg) = args.check() {
        Args::command().error(ErrorKind::ValueValidation, msg).exit();
    }
    if let Err(err) = run(&args) {
        error!("{err}");
        std::process::exit(1);
    }
}
