/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FIX tag number constants used by the session layer.
//!
//! Only the tags the engine itself reads or writes are listed here; message
//! wrappers for application payloads live outside this crate and carry their
//! own field definitions.

/// Tag 8 — BeginString: protocol version token, first field of every message.
pub const BEGIN_STRING: u32 = 8;

/// Tag 9 — BodyLength: byte count from after tag 9's delimiter up to tag 10.
pub const BODY_LENGTH: u32 = 9;

/// Tag 10 — CheckSum: three-digit modulo-256 sum of all preceding bytes.
pub const CHECK_SUM: u32 = 10;

/// Tag 35 — MsgType: message type, first field of the body.
pub const MSG_TYPE: u32 = 35;

/// Tag 34 — MsgSeqNum: message sequence number.
pub const MSG_SEQ_NUM: u32 = 34;

/// Tag 49 — SenderCompID: identity of the sending firm.
pub const SENDER_COMP_ID: u32 = 49;

/// Tag 56 — TargetCompID: identity of the receiving firm.
pub const TARGET_COMP_ID: u32 = 56;

/// Tag 52 — SendingTime: UTC timestamp of transmission.
pub const SENDING_TIME: u32 = 52;

/// Tag 43 — PossDupFlag: set to Y on retransmitted messages.
pub const POSS_DUP_FLAG: u32 = 43;

/// Tag 122 — OrigSendingTime: SendingTime of the original transmission.
pub const ORIG_SENDING_TIME: u32 = 122;

/// Tag 7 — BeginSeqNo: first sequence number of a resend range.
pub const BEGIN_SEQ_NO: u32 = 7;

/// Tag 16 — EndSeqNo: last sequence number of a resend range (0 = infinity
/// from FIX.4.2 on, 999999 before).
pub const END_SEQ_NO: u32 = 16;

/// Tag 36 — NewSeqNo: next expected sequence number after a SequenceReset.
pub const NEW_SEQ_NO: u32 = 36;

/// Tag 123 — GapFillFlag: marks a SequenceReset as a gap fill.
pub const GAP_FILL_FLAG: u32 = 123;

/// Tag 112 — TestReqID: correlates a TestRequest with its Heartbeat reply.
pub const TEST_REQ_ID: u32 = 112;

/// Tag 98 — EncryptMethod: always 0 here, encryption belongs to the transport.
pub const ENCRYPT_METHOD: u32 = 98;

/// Tag 108 — HeartBtInt: heartbeat interval in seconds, negotiated at logon.
pub const HEART_BT_INT: u32 = 108;

/// Tag 141 — ResetSeqNumFlag: requests a sequence number reset at logon.
pub const RESET_SEQ_NUM_FLAG: u32 = 141;

/// Tag 45 — RefSeqNum: sequence number of the message being rejected.
pub const REF_SEQ_NUM: u32 = 45;

/// Tag 371 — RefTagID: tag that caused a session-level reject.
pub const REF_TAG_ID: u32 = 371;

/// Tag 373 — SessionRejectReason: coded reject cause (FIX.4.2 and later).
pub const SESSION_REJECT_REASON: u32 = 373;

/// Tag 58 — Text: free-form explanation.
pub const TEXT: u32 = 58;

/// Tag 1128 — DefaultApplVerID: application version on a FIXT.1.1 Logon.
pub const DEFAULT_APPL_VER_ID: u32 = 1128;

// Application-layer tags used by the bundled demos.

/// Tag 11 — ClOrdID: client-assigned order identifier.
pub const CL_ORD_ID: u32 = 11;

/// Tag 37 — OrderID: broker-assigned order identifier.
pub const ORDER_ID: u32 = 37;

/// Tag 17 — ExecID: execution report identifier.
pub const EXEC_ID: u32 = 17;

/// Tag 55 — Symbol.
pub const SYMBOL: u32 = 55;

/// Tag 54 — Side.
pub const SIDE: u32 = 54;

/// Tag 38 — OrderQty.
pub const ORDER_QTY: u32 = 38;

/// Tag 44 — Price.
pub const PRICE: u32 = 44;

/// Tag 40 — OrdType.
pub const ORD_TYPE: u32 = 40;

/// Tag 150 — ExecType.
pub const EXEC_TYPE: u32 = 150;

/// Tag 39 — OrdStatus.
pub const ORD_STATUS: u32 = 39;

/// Tag 151 — LeavesQty.
pub const LEAVES_QTY: u32 = 151;

/// Tag 14 — CumQty.
pub const CUM_QTY: u32 = 14;

/// Tag 6 — AvgPx.
pub const AVG_PX: u32 = 6;
