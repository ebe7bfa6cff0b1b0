/// Tests for inbound classification and card references
use businessmap_mcp_probe::mcp::framing::{parse_line, Inbound};
use businessmap_mcp_probe::*;

#[cfg(test)]
mod envelope_tests {
    use super::*;

    #[test]
    fn test_tool_error_result_is_still_a_response() {
        let line = r#"{"jsonrpc":"2.0","id":3,"result":{"content":[{"type":"text","text":"Failed to read card: 404"}],"isError":true}}"#;

        match parse_line(line) {
            Some(Inbound::Response(response)) => {
                assert_eq!(response.sequence_number(), Some(3));
                assert!(!response.is_error());
                assert_eq!(response.result.unwrap()["isError"], true);
            }
            other => panic!("expected a response, got {:?}", other),
        }
    }

    #[test]
    fn test_server_request_with_id_is_not_a_response() {
        let line = r#"{"jsonrpc":"2.0","id":"srv-1","method":"ping"}"#;
        assert!(matches!(parse_line(line), Some(Inbound::ServerMessage { method, .. }) if method == "ping"));
    }

    #[test]
    fn test_null_id_error_response() {
        let line = r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":"Parse error"}}"#;
        match parse_line(line) {
            Some(Inbound::Response(response)) => {
                assert_eq!(response.sequence_number(), None);
                assert_eq!(response.error.unwrap().code, -32700);
            }
            other => panic!("expected a response, got {:?}", other),
        }
    }

    #[test]
    fn test_card_ref_display() {
        let card = CardRef::parse("https://acme.kanbanize.com/ctrl_board/5/cards/777").unwrap();
        assert_eq!(card.to_string(), "https://acme.kanbanize.com/ctrl_board/5/cards/777 (card 777)");
        assert_eq!(CardRef::parse("777").unwrap().to_string(), "777");
    }

    #[test]
    fn test_empty_card_ref_is_an_error() {
        let err = ProbeError::from(CardRef::parse(" ").unwrap_err());
        assert_eq!(err.to_string(), "Invalid card reference: card ID or URL cannot be empty");
    }
}
