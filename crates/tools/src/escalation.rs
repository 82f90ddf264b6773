//! Hand-off to a human agent.

use crate::call::EscalationArgs;
use crate::ids::ticket_id;
use chrono::{Local, Utc};
use supportdesk_core::{DomainEvent, EventBus};
use tracing::warn;

const PREVIEW_CHARS: usize = 200;

/// Tone of the escalation reply, picked from the stated reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Urgency {
    Upset,
    Complex,
    Standard,
}

impl Urgency {
    fn from_reason(reason: &str) -> Self {
        let reason = reason.to_lowercase();
        if reason.contains("frustrated") || reason.contains("angry") {
            Urgency::Upset
        } else if reason.contains("complex") {
            Urgency::Complex
        } else {
            Urgency::Standard
        }
    }
}

fn preview(message: &str) -> String {
    message.chars().take(PREVIEW_CHARS).collect()
}

/// Raise a support ticket and tell the customer what happens next.
///
/// Always succeeds. The ticket is logged at `warn` and published on the
/// event bus when one is attached.
pub fn escalate(args: &EscalationArgs, events: Option<&EventBus>) -> String {
    let ticket = ticket_id(&args.customer_message, &args.reason);
    let message_preview = preview(&args.customer_message);

    warn!(
        ticket_id = %ticket,
        timestamp = %Local::now().format("%I:%M %p"),
        reason = %args.reason,
        customer_message = %message_preview,
        "Escalated to human support"
    );

    if let Some(bus) = events {
        bus.publish(DomainEvent::EscalationCreated {
            ticket_id: ticket.clone(),
            reason: args.reason.clone(),
            message_preview,
            timestamp: Utc::now(),
        });
    }

    match Urgency::from_reason(&args.reason) {
        Urgency::Upset => format!(
            "I completely understand your frustration, and I sincerely apologize for the inconvenience.\n\n\
             I've created priority support ticket {ticket} and notified our senior support team.\n\
             A specialist will reach out to you within 15 minutes to resolve this personally.\n\n\
             Your experience matters to us, and we're committed to making this right.\n\n\
             Is there anything I can help with in the meantime?"
        ),
        Urgency::Complex => format!(
            "This situation requires specialized attention to ensure we handle it correctly.\n\n\
             I've created support ticket {ticket} and assigned it to our expert team.\n\
             They'll review your case and contact you within 30 minutes with a solution.\n\n\
             You'll receive an email confirmation with your ticket number shortly.\n\n\
             Can I help you with anything else while you wait?"
        ),
        Urgency::Standard => format!(
            "I've connected you with our human support team.\n\n\
             Support Ticket: {ticket}\n\
             Status: Assigned to agent\n\
             Expected Response: Within 15 minutes\n\n\
             A customer support specialist will reach out to you shortly via your preferred contact method.\n\n\
             Is there anything else I can assist you with?"
        ),
    }
}
