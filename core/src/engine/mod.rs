// Copyright (c) 2023 The ledger-algo Developers

//! The [Engine] provides functionality required by hardware wallets.
//!
//! This handles [Event] inputs and returns [Output] responses to the caller,
//! see [apdu][crate::apdu] for APDU protocol / encoding specifications.

use ed25519_dalek::{Signer, SigningKey};
use heapless::{String, Vec};
use strum::{Display, EnumIter, EnumString, EnumVariantNames};
use zeroize::Zeroize;

use crate::{
    apdu::CommandHeader,
    consts::{account_path, ADDRESS_LEN, HARDENED, MAX_TX_SIZE, TX_SIGN_PREFIX},
    helpers::fmt_address,
    stream::{DecodeError, DecodeStatus, Session},
    txn::Txn,
};

mod event;
pub use event::{parse_get_public_key, Event};

mod output;
pub use output::Output;

mod error;
pub use error::Error;

/// Maximum signed message size (prefix and transaction)
const MSG_SIZE: usize = MAX_TX_SIZE + TX_SIGN_PREFIX.len();

/// Engine internal state enumeration
#[derive(Copy, Clone, PartialEq, Debug, EnumString, Display, EnumVariantNames, EnumIter)]
pub enum State {
    /// Idle state, no transaction running
    Init,
    /// Receiving transaction chunks
    Receiving,
    /// Transaction pending user approval
    Pending,
    /// Transaction signed
    Complete,
    /// Transaction denied
    Deny,
    /// Transaction failed
    Error,
}

/// [Engine] provides hardware-independent support for Algorand wallet operations
pub struct Engine<DRV: Driver> {
    state: State,

    account_index: u32,

    session: Session,

    drv: DRV,
}

/// [`Driver`] trait provides platform support for [`Engine`] instances
pub trait Driver {
    /// SLIP-0010 derivation for ed25519 keys
    fn slip10_derive_ed25519(&self, path: &[u32]) -> [u8; 32];
}

impl<T: Driver> Driver for &mut T {
    fn slip10_derive_ed25519(&self, path: &[u32]) -> [u8; 32] {
        T::slip10_derive_ed25519(self, path)
    }
}

impl<DRV: Driver> Engine<DRV> {
    /// Create a new engine instance with the provided driver
    pub fn new(drv: DRV) -> Self {
        Self {
            state: State::Init,
            account_index: 0,
            session: Session::new(),
            drv,
        }
    }

    /// Handle incoming events
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn update(&mut self, evt: &Event) -> Result<Output, Error> {
        #[cfg(feature = "log")]
        log::debug!("event: {:02x?}", evt);

        match (self.state, evt) {
            // Empty event, do nothing
            (_, Event::None) => Ok(Output::None),

            // Fetch public key, abandoning any running transaction
            (_, Event::GetPublicKey { account_index }) => {
                self.reset();

                let public_key = self.public_key(*account_index);
                Ok(Output::PublicKey { public_key })
            }

            // Fetch public key and format the address for display
            (_, Event::ShowAddress { account_index }) => {
                self.reset();

                let public_key = self.public_key(*account_index);

                let mut buff = [0u8; ADDRESS_LEN];
                let address = String::try_from(fmt_address(&public_key, &mut buff))
                    .map_err(|_| Error::EncodingFailed)?;

                Ok(Output::Address {
                    public_key,
                    address,
                })
            }

            // Start a new transaction
            (
                _,
                Event::SignChunk {
                    first: true,
                    more,
                    account_index,
                    data,
                },
            ) => {
                self.reset();

                let account_index = account_index.unwrap_or(0);
                if account_index & HARDENED != 0 {
                    return self.fail(Error::InvalidAccount);
                }

                self.account_index = account_index;
                self.state = State::Receiving;

                self.push(data, *more)
            }

            // Continue a transaction
            (
                State::Receiving,
                Event::SignChunk {
                    first: false,
                    more,
                    data,
                    ..
                },
            ) => self.push(data, *more),

            // Handle unexpected events
            _e => {
                #[cfg(feature = "log")]
                log::error!("Unexpected event in state {:?}: {:02x?}", self.state, _e);

                self.fail(Error::UnexpectedEvent)
            }
        }
    }

    /// Handle a command APDU (`CLA INS P1 P2 Lc DATA`).
    ///
    /// Commands that can not be parsed, including unknown instructions and
    /// payloads not matching `Lc`, abandon any running transaction.
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn handle(&mut self, cmd: &[u8]) -> Result<Output, Error> {
        let evt = CommandHeader::parse(cmd)
            .map_err(|_| Error::InvalidLength)
            .and_then(|(h, data)| Event::parse(h.ins, h.p1, h.p2, data));

        match evt {
            Ok(evt) => self.update(&evt),
            Err(e) => {
                #[cfg(feature = "log")]
                log::warn!("invalid command, resetting: {:?}", e);

                self.reset();
                Err(e)
            }
        }
    }

    /// Append transaction data to the session and map the decode status
    fn push(&mut self, data: &[u8], more: bool) -> Result<Output, Error> {
        match (self.session.push(data), more) {
            (DecodeStatus::NeedMoreData, true) => Ok(Output::FetchMore),
            (DecodeStatus::NeedMoreData, false) => self.fail(DecodeError::Truncated.into()),
            (DecodeStatus::Complete, false) => {
                #[cfg(feature = "log")]
                log::info!(
                    "transaction decoded ({} bytes, {:?}), pending approval",
                    self.session.data().len(),
                    self.session.txn().kind,
                );

                self.state = State::Pending;
                Ok(Output::Pending)
            }
            (DecodeStatus::Complete, true) => self.fail(DecodeError::TrailingBytes.into()),
            (DecodeStatus::DecodeError(e), _) => self.fail(e.into()),
        }
    }

    /// Reset the session and move to the error state
    fn fail(&mut self, e: Error) -> Result<Output, Error> {
        #[cfg(feature = "log")]
        log::warn!("transaction failed: {:?}", e);

        self.session.reset();
        self.state = State::Error;

        Err(e)
    }

    /// Approve a pending transaction, returning the signature
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn approve(&mut self) -> Result<Output, Error> {
        if self.state != State::Pending {
            return Err(Error::UnexpectedEvent);
        }

        let signature = self.sign()?;

        // Signed transactions can not be re-used
        self.session.reset();
        self.state = State::Complete;

        Ok(Output::Signature { signature })
    }

    /// Deny a pending transaction
    pub fn deny(&mut self) -> Result<Output, Error> {
        if self.state != State::Pending {
            return Err(Error::UnexpectedEvent);
        }

        self.session.reset();
        self.state = State::Deny;

        Err(Error::Rejected)
    }

    /// Reset the engine, discarding any running transaction
    pub fn reset(&mut self) {
        self.session.reset();
        self.account_index = 0;
        self.state = State::Init;
    }

    /// Fetch current engine state
    pub fn state(&self) -> State {
        self.state
    }

    /// Fetch the signing account for the current transaction
    pub fn account_index(&self) -> u32 {
        self.account_index
    }

    /// Fetch the (partially) decoded transaction for display
    pub fn txn(&self) -> &Txn {
        self.session.txn()
    }

    /// Fetch the active signing session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Derive the signing key for an account
    fn signing_key(&self, account_index: u32) -> SigningKey {
        let mut seed = self.drv.slip10_derive_ed25519(&account_path(account_index));
        let k = SigningKey::from_bytes(&seed);

        seed.zeroize();

        k
    }

    /// Fetch the ed25519 public key for an account
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn public_key(&self, account_index: u32) -> [u8; 32] {
        self.signing_key(account_index).verifying_key().to_bytes()
    }

    /// Sign the received transaction with the selected account
    fn sign(&self) -> Result<[u8; 64], Error> {
        let mut m = Vec::<u8, MSG_SIZE>::new();
        m.extend_from_slice(TX_SIGN_PREFIX)
            .map_err(|_| Error::EncodingFailed)?;
        m.extend_from_slice(self.session.data())
            .map_err(|_| Error::EncodingFailed)?;

        let k = self.signing_key(self.account_index);
        let s = k.sign(&m);

        m.as_mut_slice().zeroize();

        Ok(s.to_bytes())
    }
}

#[cfg(test)]
mod test {
    extern crate std;

    use strum::IntoEnumIterator;

    use super::*;

    /// Driver implementation for test use
    pub struct TestDriver {
        pub seed: [u8; 32],
    }

    impl Driver for TestDriver {
        fn slip10_derive_ed25519(&self, path: &[u32]) -> [u8; 32] {
            slip10_ed25519::derive_ed25519_private_key(&self.seed, path)
        }
    }

    // {"fee": 1000, "snd": [0x01; 32], "type": "pay"}
    const TXN: &[u8] = &[
        0x83, 0xa3, b'f', b'e', b'e', 0xcd, 0x03, 0xe8, 0xa3, b's', b'n', b'd', 0xc4, 0x20, 1, 1,
        1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
        0xa4, b't', b'y', b'p', b'e', 0xa3, b'p', b'a', b'y',
    ];

    fn chunk(first: bool, more: bool, data: &[u8]) -> Event {
        Event::SignChunk {
            first,
            more,
            account_index: None,
            data,
        }
    }

    #[test]
    fn sign_flow() {
        let mut e = Engine::new(TestDriver { seed: [7u8; 32] });
        assert_eq!(e.state(), State::Init);

        assert_eq!(e.update(&chunk(true, true, &TXN[..20])), Ok(Output::FetchMore));
        assert_eq!(e.state(), State::Receiving);

        assert_eq!(e.update(&chunk(false, false, &TXN[20..])), Ok(Output::Pending));
        assert_eq!(e.state(), State::Pending);
        assert_eq!(e.txn().fee, 1000);

        let r = e.approve();
        assert!(matches!(r, Ok(Output::Signature { .. })), "{r:?}");
        assert_eq!(e.state(), State::Complete);

        // Signatures are only issued once
        assert_eq!(e.approve(), Err(Error::UnexpectedEvent));
    }

    #[test]
    fn deny_flow() {
        let mut e = Engine::new(TestDriver { seed: [7u8; 32] });

        assert_eq!(e.update(&chunk(true, false, TXN)), Ok(Output::Pending));
        assert_eq!(e.deny(), Err(Error::Rejected));
        assert_eq!(e.state(), State::Deny);
        assert!(e.session().data().is_empty());
    }

    #[test]
    fn continuation_without_start() {
        for s in State::iter().filter(|s| *s != State::Receiving) {
            let mut e = Engine::new(TestDriver { seed: [7u8; 32] });
            e.state = s;

            assert_eq!(
                e.update(&chunk(false, false, TXN)),
                Err(Error::UnexpectedEvent),
                "state {s}"
            );
            assert_eq!(e.state(), State::Error);
        }
    }

    #[test]
    fn missing_chunks() {
        let mut e = Engine::new(TestDriver { seed: [7u8; 32] });

        assert_eq!(
            e.update(&chunk(true, false, &TXN[..20])),
            Err(Error::Decode(DecodeError::Truncated))
        );
        assert_eq!(e.state(), State::Error);
    }

    #[test]
    fn unexpected_chunks() {
        let mut e = Engine::new(TestDriver { seed: [7u8; 32] });

        assert_eq!(
            e.update(&chunk(true, true, TXN)),
            Err(Error::Decode(DecodeError::TrailingBytes))
        );
        assert_eq!(e.state(), State::Error);
    }

    #[test]
    fn unrelated_command_resets() {
        let mut e = Engine::new(TestDriver { seed: [7u8; 32] });

        // Unknown instruction, then a get public key with a bad payload
        let cmds: [&[u8]; 2] = [
            &[0x80, 0x42, 0x00, 0x00, 0x00],
            &[0x80, 0x03, 0x00, 0x00, 0x02, 0x00, 0x00],
        ];

        for cmd in cmds {
            assert_eq!(
                e.update(&chunk(true, true, &TXN[..20])),
                Ok(Output::FetchMore)
            );
            assert!(e.handle(cmd).is_err());

            assert_eq!(e.state(), State::Init);
            assert!(e.session().data().is_empty());

            // Remaining chunks of the abandoned transaction are rejected
            assert_eq!(
                e.update(&chunk(false, false, &TXN[20..])),
                Err(Error::UnexpectedEvent)
            );
        }
    }

    #[test]
    fn command_length_mismatch() {
        let mut e = Engine::new(TestDriver { seed: [7u8; 32] });

        let mut cmd = [0u8; 15];
        cmd[..5].copy_from_slice(&[0x80, 0x08, 0x00, 0x00, 250]);

        let r = e.handle(&cmd);
        assert_eq!(r, Err(Error::InvalidLength));
        assert_eq!(r.map_err(|e| e.status_word() as u16), Err(0x6a85));
        assert_eq!(e.state(), State::Init);
    }

    #[test]
    fn unhardenable_account() {
        let mut e = Engine::new(TestDriver { seed: [7u8; 32] });

        let evt = Event::SignChunk {
            first: true,
            more: false,
            account_index: Some(HARDENED),
            data: TXN,
        };
        assert_eq!(e.update(&evt), Err(Error::InvalidAccount));
    }
}
