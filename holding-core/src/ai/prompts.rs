//! Prompt Templates for AI Operations
//!
//! The generator sees one flat text per request, so chat history is folded
//! into the prompt as a transcript.

use super::assistant::{ChatMessage, ChatRole};

/// Instructions for the executive advisor chat
pub fn chat_instruction(holding_name: &str) -> String {
    format!(
        r#"Sei l'assistente esecutivo virtuale di alto livello per "{holding}", una holding internazionale.
Il tuo tono è professionale, strategico, conciso ed estremamente competente.
Parli italiano fluente.
Il tuo obiettivo è aiutare il CEO a monitorare il business, analizzare opportunità e risolvere problemi.
Quando parli di dati finanziari, sii preciso."#,
        holding = holding_name
    )
}

/// Instructions for the strategic text analysis
pub fn analysis_instruction(holding_name: &str) -> String {
    format!(
        r#"Sei un analista di strategia aziendale senior per {holding}.
Il tuo compito è analizzare i dati o i testi forniti e restituire un'analisi SWOT, rischi potenziali e opportunità di crescita.
Usa una formattazione Markdown chiara."#,
        holding = holding_name
    )
}

fn speaker(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "Utente",
        ChatRole::Model => "Advisor",
    }
}

/// Transcript of `history` in order, followed by the new message
pub fn build_chat_prompt(history: &[ChatMessage], new_message: &str) -> String {
    let mut prompt = String::new();

    if !history.is_empty() {
        prompt.push_str("## Conversazione\n");
        for message in history {
            prompt.push_str(&format!("{}: {}\n", speaker(message.role), message.text.trim()));
        }
        prompt.push('\n');
    }

    prompt.push_str("## Nuovo messaggio\n");
    prompt.push_str(new_message.trim());
    prompt.push_str("\n\nRispondi come Advisor.");
    prompt
}

pub fn build_analysis_prompt(holding_name: &str, input: &str) -> String {
    format!(
        "Analizza il seguente testo/dato aziendale per {}:\n\n{}",
        holding_name, input
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_prompt_keeps_history_order() {
        let history = vec![
            ChatMessage::new(ChatRole::Model, "Salve."),
            ChatMessage::new(ChatRole::User, "Come va RFX Wallet?"),
            ChatMessage::new(ChatRole::Model, "In sviluppo al 45%."),
        ];
        let prompt = build_chat_prompt(&history, "  E il Core?  ");

        let first = prompt.find("Advisor: Salve.").unwrap();
        let second = prompt.find("Utente: Come va RFX Wallet?").unwrap();
        let third = prompt.find("Advisor: In sviluppo al 45%.").unwrap();
        assert!(first < second && second < third);
        assert!(prompt.contains("## Nuovo messaggio\nE il Core?\n"));
    }

    #[test]
    fn test_chat_prompt_without_history() {
        let prompt = build_chat_prompt(&[], "Ciao");
        assert!(!prompt.contains("## Conversazione"));
        assert!(prompt.starts_with("## Nuovo messaggio\nCiao"));
    }

    #[test]
    fn test_instructions_name_the_holding() {
        assert!(chat_instruction("Acme Holding").contains("\"Acme Holding\""));
        assert!(analysis_instruction("Acme Holding").contains("SWOT"));
        assert_eq!(
            build_analysis_prompt("Acme", "ricavi +10%"),
            "Analizza il seguente testo/dato aziendale per Acme:\n\nricavi +10%"
        );
    }
}
