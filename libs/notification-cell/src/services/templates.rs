use crate::models::BookingNotice;

fn when(notice: &BookingNotice) -> String {
    notice.scheduled_at.format("%d/%m/%Y às %H:%M").to_string()
}

pub fn booking_created(notice: &BookingNotice) -> String {
    format!(
        "Olá, {}! Sua consulta de {} foi agendada para {}.\n\
         Valor: R$ {:.2}. Você receberá a confirmação em breve.",
        notice.client_name,
        notice.consultation_name,
        when(notice),
        notice.amount_charged
    )
}

pub fn booking_received_for_admin(notice: &BookingNotice) -> String {
    format!(
        "Novo agendamento: {} ({}) - {} em {} - R$ {:.2}",
        notice.client_name,
        notice.client_phone,
        notice.consultation_name,
        when(notice),
        notice.amount_charged
    )
}

pub fn appointment_confirmed(notice: &BookingNotice) -> String {
    let mut message = format!(
        "Olá, {}! Sua consulta de {} em {} está confirmada.",
        notice.client_name,
        notice.consultation_name,
        when(notice)
    );

    if let Some(link) = notice.meeting_link.as_deref().filter(|l| !l.is_empty()) {
        message.push_str(&format!("\nLink da reunião: {}", link));
    }

    message
}

pub fn appointment_canceled(notice: &BookingNotice) -> String {
    format!(
        "Olá, {}. Sua consulta de {} marcada para {} foi cancelada. \
         Entre em contato para reagendar.",
        notice.client_name,
        notice.consultation_name,
        when(notice)
    )
}
