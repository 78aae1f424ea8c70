//! Response constants: literal status lines and fixed text used across
//! the handlers. Lines that must carry a dynamic argument (an article
//! number, a count, a Message-ID) are assembled with `format!` at the
//! call site instead of living here.

pub const RESP_CRLF: &str = "\r\n";
pub const RESP_DOT_CRLF: &str = ".\r\n";

// Greeting
pub const RESP_205_CLOSING: &str = "205 closing connection\r\n";

// MODE READER
pub const RESP_200_POSTING_ALLOWED: &str = "200 Posting allowed\r\n";
pub const RESP_201_POSTING_PROHIBITED: &str = "201 Posting prohibited\r\n";

// GROUP / LISTGROUP
pub const RESP_211_LISTGROUP_FOLLOWS: &str = "211 article numbers follow\r\n";

// LIST family
pub const RESP_215_ACTIVE: &str = "215 list of newsgroups follows\r\n";
pub const RESP_215_ACTIVE_TIMES: &str = "215 newsgroup creation times follow\r\n";
pub const RESP_215_NEWSGROUPS: &str = "215 newsgroup descriptions follow\r\n";
pub const RESP_215_HEADERS: &str = "215 metadata items supported\r\n";
pub const RESP_215_OVERVIEW_FMT: &str = "215 order of fields in overview database\r\n";

// Article retrieval
pub const RESP_224_OVERVIEW: &str = "224 overview information follows\r\n";
pub const RESP_225_HDR_FOLLOWS: &str = "225 headers follow\r\n";

// NEWGROUPS / NEWNEWS
pub const RESP_230_NEWNEWS: &str = "230 list of new articles follows\r\n";
pub const RESP_231_NEWGROUPS: &str = "231 list of new newsgroups follows\r\n";

// POST / IHAVE
pub const RESP_235_TRANSFER_OK: &str = "235 article transferred OK\r\n";
pub const RESP_281_AUTH_OK: &str = "281 authentication accepted\r\n";
pub const RESP_335_SEND_IT: &str = "335 send article; end with CRLF.CRLF\r\n";
pub const RESP_340_SEND_ARTICLE: &str = "340 send article; end with CRLF.CRLF\r\n";
pub const RESP_381_PASSWORD_REQUIRED: &str = "381 password required\r\n";

// 4xx
pub const RESP_412_NO_GROUP: &str = "412 no newsgroup selected\r\n";
pub const RESP_420_NO_CURRENT: &str = "420 no current article selected\r\n";
pub const RESP_421_NO_NEXT: &str = "421 no next article in this group\r\n";
pub const RESP_422_NO_PREV: &str = "422 no previous article in this group\r\n";
pub const RESP_423_RANGE_EMPTY: &str = "423 no articles in that range\r\n";
pub const RESP_430_NO_ARTICLE: &str = "430 no such article\r\n";
pub const RESP_435_NOT_WANTED: &str = "435 article not wanted\r\n";
pub const RESP_437_REJECTED: &str = "437 article rejected\r\n";
pub const RESP_440_POSTING_NOT_ALLOWED: &str = "440 posting not allowed\r\n";
pub const RESP_441_POSTING_FAILED: &str = "441 posting failed\r\n";
pub const RESP_481_AUTH_REJECTED: &str = "481 authentication rejected\r\n";
pub const RESP_482_AUTH_OUT_OF_SEQUENCE: &str = "482 authentication commands out of sequence\r\n";

// 5xx
pub const RESP_500_UNKNOWN_COMMAND: &str = "500 command not recognized\r\n";
pub const RESP_500_IHAVE_NOT_PERMITTED: &str = "500 transfer not permitted\r\n";
pub const RESP_501_SYNTAX: &str = "501 syntax error\r\n";
pub const RESP_502_UNKNOWN: &str = "502 command not available\r\n";

// CAPABILITIES / HELP
pub const RESP_100_HELP_FOLLOWS: &str = "100 help text follows\r\n";
pub const RESP_101_CAPABILITIES: &str = "101 capability list follows\r\n";
pub const RESP_CAP_VERSION: &str = "VERSION 2\r\n";

pub const RESP_HELP_TEXT: &str = concat!(
    "CAPABILITIES\r\n",
    "MODE READER\r\n",
    "GROUP\r\n",
    "LISTGROUP\r\n",
    "LIST\r\n",
    "ARTICLE\r\n",
    "HEAD\r\n",
    "BODY\r\n",
    "STAT\r\n",
    "HDR\r\n",
    "XPAT\r\n",
    "OVER\r\n",
    "XOVER\r\n",
    "NEXT\r\n",
    "LAST\r\n",
    "NEWGROUPS\r\n",
    "NEWNEWS\r\n",
    "POST\r\n",
    "IHAVE\r\n",
    "AUTHINFO USER\r\n",
    "AUTHINFO PASS\r\n",
    "DATE\r\n",
    "HELP\r\n",
    "QUIT\r\n"
);
