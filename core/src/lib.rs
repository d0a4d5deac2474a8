// Copyright (c) 2023 The ledger-algo Developers

//! Algorand hardware wallet core
//!
//! This provides a common [Engine][engine] supporting public key derivation and
//! transaction signing for execution on hardware wallets.
//!
//! Interactions with the [Engine][engine] are performed via [Event][engine::Event]s and [Output][engine::Output]s,
//! see [ledger_algo_apdu] for APDU objects and wire encodings.
//! Raw command APDUs may be passed directly via [Engine::handle][engine::Engine::handle],
//! any command that fails to parse abandons a running transaction.
//!
//! ## Operations
//!
//! ### Requesting public keys
//!
//! Public keys can be requested via [`GetPublicKeyReq`][ledger_algo_apdu::public_key::GetPublicKeyReq]
//! APDU, returning a [`PublicKeyResp`][ledger_algo_apdu::public_key::PublicKeyResp] containing
//! the ed25519 public key for the account at `m/44'/283'/account'/0'/0'`. An empty request
//! payload selects the default account (index 0).
//!
//! [`GetAddressReq`][ledger_algo_apdu::public_key::GetAddressReq] additionally formats
//! the Algorand address for display on the device.
//!
//! ### Signing a transaction
//!
//! Transactions are streamed as their canonical MessagePack encoding, split across
//! [`SignMsgpackChunk`][ledger_algo_apdu::sign::SignMsgpackChunk] APDUs
//! (see [`sign_chunks`][ledger_algo_apdu::sign::sign_chunks]).
//!
//! 1. The first chunk starts a new [Session][stream::Session], optionally selecting
//!    the signing account
//! 2. Each chunk is appended to a fixed capacity working buffer and decoded as far as
//!    possible, returning [`FetchMore`][engine::Output::FetchMore] until the
//!    transaction is complete
//! 3. Once the final chunk is decoded the engine enters the
//!    [`Pending`][engine::State::Pending] state, displaying the [Txn][txn::Txn] for approval
//! 4. On approval the engine signs `"TX" || transaction` and returns the signature,
//!    on rejection the session is cleared
//!
//! Decoding failures or oversized transactions abort the session, see
//! [Error::status_word][engine::Error::status_word] for the mapping to wire status words.

#![cfg_attr(not(feature = "std"), no_std)]

pub use ledger_algo_apdu::{self as apdu};

pub mod consts;

pub mod engine;

pub mod helpers;

pub mod msgpack;

pub mod stream;

pub mod txn;
