#![allow(unused)]

use bip39::{Language, Mnemonic, Seed};
use encdec::Encode;
use log::{debug, trace};

use ledger_algo_core::{
    apdu::{prelude::*, ApduStatic},
    engine::{Driver, Engine, Error, Output},
};

pub const MNEMONIC: &str = "duck deal pretty pen thunder economy wide common goose fit engine main aisle curtain choose cube claim snake enroll detect brief history float unit";

pub const SENDER: [u8; 32] = [0x11; 32];
pub const RECEIVER: [u8; 32] = [0x22; 32];
pub const CLOSE_TO: [u8; 32] = [0x33; 32];
pub const GENESIS_HASH: [u8; 32] = [0x44; 32];
pub const GROUP: [u8; 32] = [0x55; 32];
pub const REKEY_TO: [u8; 32] = [0x77; 32];

/// Setup logging for tests
pub fn init_logger() {
    let _ = simplelog::SimpleLogger::init(log::LevelFilter::Debug, Default::default());
}

/// Driver implementation for test use
pub struct TestDriver {
    /// BIP39 Mnemonic derived seed
    pub seed: [u8; 64],
}

impl TestDriver {
    pub fn new(seed: Seed) -> Self {
        let mut b = [0u8; 64];
        b.copy_from_slice(seed.as_bytes());
        Self { seed: b }
    }

    /// Create a test driver from the test mnemonic
    pub fn mnemonic() -> anyhow::Result<Self> {
        let mnemonic = Mnemonic::from_phrase(MNEMONIC, Language::English)?;
        Ok(Self::new(Seed::new(&mnemonic, "")))
    }
}

impl Driver for TestDriver {
    fn slip10_derive_ed25519(&self, path: &[u32]) -> [u8; 32] {
        slip10_ed25519::derive_ed25519_private_key(&self.seed, path)
    }
}

/// Build a command APDU and pass it to the engine
pub fn exchange(
    e: &mut Engine<TestDriver>,
    ins: u8,
    p1: u8,
    p2: u8,
    data: &[u8],
) -> Result<Output, Error> {
    let mut cmd = vec![0u8; COMMAND_HEADER_LEN];
    CommandHeader::new(ins, p1, p2, data.len() as u8)
        .encode(&mut cmd)
        .expect("encode failed");
    cmd.extend_from_slice(data);

    exchange_raw(e, &cmd)
}

/// Pass a raw command APDU to the engine
pub fn exchange_raw(e: &mut Engine<TestDriver>, cmd: &[u8]) -> Result<Output, Error> {
    trace!("cmd: {:02x?}", cmd);

    let r = e.handle(cmd);

    debug!("resp: {:?}", r);

    r
}

/// Stream a transaction to the engine in `chunk_size` APDUs, returning the
/// output for the final chunk
pub fn sign_txn(
    e: &mut Engine<TestDriver>,
    account_index: Option<u32>,
    txn: &[u8],
    chunk_size: usize,
) -> Result<Output, Error> {
    let mut r = Ok(Output::None);

    for c in sign_chunks(account_index, txn, chunk_size) {
        let mut buff = [0u8; 256];
        let n = c.encode(&mut buff).expect("encode failed");

        r = exchange(
            e,
            SignMsgpackChunk::INS,
            c.p1().bits(),
            c.p2().bits(),
            &buff[..n],
        );

        match &r {
            Ok(Output::FetchMore) => continue,
            _ => break,
        }
    }

    r
}

/// Minimal MessagePack writer for building test transactions
#[derive(Default)]
pub struct Encoder {
    buff: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(mut self, n: usize) -> Self {
        match n {
            0..=15 => self.buff.push(0x80 | n as u8),
            _ => {
                self.buff.push(0xde);
                self.buff.extend_from_slice(&(n as u16).to_be_bytes());
            }
        }
        self
    }

    pub fn array(mut self, n: usize) -> Self {
        match n {
            0..=15 => self.buff.push(0x90 | n as u8),
            _ => {
                self.buff.push(0xdc);
                self.buff.extend_from_slice(&(n as u16).to_be_bytes());
            }
        }
        self
    }

    pub fn str(mut self, s: &str) -> Self {
        let n = s.len();
        match n {
            0..=31 => self.buff.push(0xa0 | n as u8),
            32..=255 => self.buff.extend_from_slice(&[0xd9, n as u8]),
            _ => {
                self.buff.push(0xda);
                self.buff.extend_from_slice(&(n as u16).to_be_bytes());
            }
        }
        self.buff.extend_from_slice(s.as_bytes());
        self
    }

    pub fn uint(mut self, v: u64) -> Self {
        match v {
            0..=0x7f => self.buff.push(v as u8),
            0x80..=0xff => self.buff.extend_from_slice(&[0xcc, v as u8]),
            0x100..=0xffff => {
                self.buff.push(0xcd);
                self.buff.extend_from_slice(&(v as u16).to_be_bytes());
            }
            0x1_0000..=0xffff_ffff => {
                self.buff.push(0xce);
                self.buff.extend_from_slice(&(v as u32).to_be_bytes());
            }
            _ => {
                self.buff.push(0xcf);
                self.buff.extend_from_slice(&v.to_be_bytes());
            }
        }
        self
    }

    pub fn bool(mut self, v: bool) -> Self {
        self.buff.push(if v { 0xc3 } else { 0xc2 });
        self
    }

    pub fn bin(mut self, b: &[u8]) -> Self {
        let n = b.len();
        match n {
            0..=255 => self.buff.extend_from_slice(&[0xc4, n as u8]),
            _ => {
                self.buff.push(0xc5);
                self.buff.extend_from_slice(&(n as u16).to_be_bytes());
            }
        }
        self.buff.extend_from_slice(b);
        self
    }

    pub fn raw(mut self, b: &[u8]) -> Self {
        self.buff.extend_from_slice(b);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.buff
    }
}

/// Payment transaction with the provided note
pub fn payment(note: &[u8]) -> Vec<u8> {
    Encoder::new()
        .map(11)
        .str("amt")
        .uint(1_000_000)
        .str("close")
        .bin(&CLOSE_TO)
        .str("fee")
        .uint(30_000)
        .str("fv")
        .uint(5_667_360)
        .str("gen")
        .str("testnet-v1.0")
        .str("gh")
        .bin(&GENESIS_HASH)
        .str("lv")
        .uint(5_668_360)
        .str("note")
        .bin(note)
        .str("rcv")
        .bin(&RECEIVER)
        .str("snd")
        .bin(&SENDER)
        .str("type")
        .str("pay")
        .finish()
}

/// 300-byte grouped payment, byte 150 is the `lv` key marker
pub fn payment_300() -> Vec<u8> {
    let t = Encoder::new()
        .map(13)
        .str("amt")
        .uint(100)
        .str("close")
        .bin(&CLOSE_TO)
        .str("fee")
        .uint(1000)
        .str("fv")
        .uint(5_667_360)
        .str("gen")
        .str("devnet-v1")
        .str("gh")
        .bin(&GENESIS_HASH)
        .str("grp")
        .bin(&GROUP)
        .str("lv")
        .uint(5_668_360)
        .str("note")
        .bin(b"0123456789")
        .str("rcv")
        .bin(&RECEIVER)
        .str("rekey")
        .bin(&REKEY_TO)
        .str("snd")
        .bin(&SENDER)
        .str("type")
        .str("pay")
        .finish();

    assert_eq!(t.len(), 300);
    assert_eq!(t[150], 0xa2);

    t
}

/// Key registration transaction
pub fn keyreg() -> Vec<u8> {
    Encoder::new()
        .map(11)
        .str("fee")
        .uint(1000)
        .str("fv")
        .uint(100)
        .str("gh")
        .bin(&GENESIS_HASH)
        .str("lv")
        .uint(1100)
        .str("selkey")
        .bin(&[0x01; 32])
        .str("snd")
        .bin(&SENDER)
        .str("sprfkey")
        .bin(&[0x02; 64])
        .str("type")
        .str("keyreg")
        .str("votefst")
        .uint(100)
        .str("votekd")
        .uint(10_000)
        .str("votekey")
        .bin(&[0x03; 32])
        .finish()
}

/// Asset transfer transaction
pub fn asset_transfer() -> Vec<u8> {
    Encoder::new()
        .map(9)
        .str("aamt")
        .uint(5_000_000_000)
        .str("arcv")
        .bin(&RECEIVER)
        .str("fee")
        .uint(1000)
        .str("fv")
        .uint(100)
        .str("gh")
        .bin(&GENESIS_HASH)
        .str("lv")
        .uint(1100)
        .str("snd")
        .bin(&SENDER)
        .str("type")
        .str("axfer")
        .str("xaid")
        .uint(31_566_704)
        .finish()
}

/// Asset freeze transaction
pub fn asset_freeze() -> Vec<u8> {
    Encoder::new()
        .map(9)
        .str("afrz")
        .bool(true)
        .str("fadd")
        .bin(&RECEIVER)
        .str("faid")
        .uint(31_566_704)
        .str("fee")
        .uint(1000)
        .str("fv")
        .uint(100)
        .str("gh")
        .bin(&GENESIS_HASH)
        .str("lv")
        .uint(1100)
        .str("snd")
        .bin(&SENDER)
        .str("type")
        .str("afrz")
        .finish()
}

/// Asset creation transaction
pub fn asset_config() -> Vec<u8> {
    Encoder::new()
        .map(7)
        .str("apar")
        .map(6)
        .str("an")
        .str("Test Asset")
        .str("au")
        .str("https://example.com/asset")
        .str("dc")
        .uint(6)
        .str("m")
        .bin(&SENDER)
        .str("t")
        .uint(10_000_000)
        .str("un")
        .str("TST")
        .str("fee")
        .uint(1000)
        .str("fv")
        .uint(100)
        .str("gh")
        .bin(&GENESIS_HASH)
        .str("lv")
        .uint(1100)
        .str("snd")
        .bin(&SENDER)
        .str("type")
        .str("acfg")
        .finish()
}

/// Application call transaction
pub fn app_call() -> Vec<u8> {
    Encoder::new()
        .map(12)
        .str("apaa")
        .array(2)
        .bin(b"transfer")
        .bin(&[0x00, 0x00, 0x00, 0x2a])
        .str("apan")
        .uint(1)
        .str("apas")
        .array(1)
        .uint(31_566_704)
        .str("apat")
        .array(1)
        .bin(&RECEIVER)
        .str("apfa")
        .array(2)
        .uint(7)
        .uint(8)
        .str("apgs")
        .map(2)
        .str("nbs")
        .uint(1)
        .str("nui")
        .uint(2)
        .str("apid")
        .uint(1234)
        .str("fee")
        .uint(1000)
        .str("fv")
        .uint(100)
        .str("lv")
        .uint(1100)
        .str("snd")
        .bin(&SENDER)
        .str("type")
        .str("appl")
        .finish()
}

/// All well-formed transaction fixtures
pub fn fixtures() -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("payment", payment(b"Hello World")),
        ("payment_300", payment_300()),
        ("keyreg", keyreg()),
        ("asset_transfer", asset_transfer()),
        ("asset_freeze", asset_freeze()),
        ("asset_config", asset_config()),
        ("app_call", app_call()),
    ]
}
