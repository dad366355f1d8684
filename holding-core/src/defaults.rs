//! Factory templates and demo data shipped with a fresh session.

use chrono::NaiveDate;

use crate::models::{
    CompanyCategory, CompanyStep, DetailedCompany, EntityStatus, EntityType, TemplateCategory,
    TrackedEntity,
};

/// Factory company onboarding template
pub fn company_template() -> Vec<TemplateCategory> {
    vec![
        TemplateCategory::new(
            "tpl_cat_1",
            "Costituzione",
            &[
                "Definizione strategia holding",
                "Scelta forma giuridica (SRL)",
                "Redazione atto costitutivo",
                "Apertura conto bancario",
                "Versamento capitale sociale",
                "Rogito notarile",
                "Iscrizione Camera di Commercio",
                "Richiesta Partita IVA",
                "Apertura posizione INPS/INAIL",
            ],
        ),
        TemplateCategory::new(
            "tpl_cat_2",
            "Immagine Coordinata",
            &[
                "Creazione logo e brand identity",
                "Sviluppo sito web corporate",
                "Design carta intestata e materiali",
                "Apertura profili social (LinkedIn)",
                "Strategia di comunicazione holding",
                "Piano editoriale e content strategy",
            ],
        ),
        TemplateCategory::new(
            "tpl_cat_3",
            "Struttura Commerciale",
            &[
                "Definizione strategia commerciale holding",
                "Struttura governance e investimenti",
                "Piano di acquisizione società",
                "Modello di valutazione investimenti",
                "Materiali investor relations",
                "KPI e obiettivi strategici holding",
            ],
        ),
        TemplateCategory::new(
            "tpl_cat_4",
            "Sistema CRM",
            &[
                "Analisi esigenze gestione partecipazioni",
                "Scelta piattaforma ERP/CRM holding",
                "Configurazione dashboard consolidata",
                "Integrazione con sistemi controllate",
                "Formazione team holding su sistemi",
                "Reporting e analytics consolidati",
            ],
        ),
    ]
}

/// Factory ERP build-out template
pub fn erp_template() -> Vec<TemplateCategory> {
    vec![
        TemplateCategory::new(
            "erp_tpl_core",
            "Architettura & Backend",
            &[
                "Setup Ambiente Cloud (AWS/Azure)",
                "Progettazione Database Relazionale (SQL)",
                "Implementazione API Gateway",
                "Sistema di Autenticazione (SSO/JWT)",
                "Configurazione Backup Automatici",
            ],
        ),
        TemplateCategory::new(
            "erp_tpl_sales",
            "Modulo Vendite & CRM",
            &[
                "Gestione Anagrafica Clienti",
                "Pipeline Opportunità e Lead",
                "Motore Calcolo Preventivi",
                "Generazione Ordini e Contratti",
                "Sincronizzazione Magazzino",
            ],
        ),
        TemplateCategory::new(
            "erp_tpl_partners",
            "Gestione Rete & Provvigioni",
            &[
                "Anagrafica Agenti e Gerarchie",
                "Motore Calcolo Provvigioni (Engine)",
                "Sistema di Fatturazione Automatica Agenti",
                "Gestione Mandati e Contratti",
                "Portale Self-Service Partner",
            ],
        ),
        TemplateCategory::new(
            "erp_tpl_app",
            "App Agenti (Mobile)",
            &[
                "UX/UI Design Mobile",
                "Sviluppo Modulo Presa Ordini Offline",
                "Geolocalizzazione e Giro Visite",
                "Catalogo Digitale Interattivo",
                "Integrazione Firma Digitale",
            ],
        ),
    ]
}

fn category(id: &str, name: &str, steps: &[(&str, &str, bool)]) -> CompanyCategory {
    let mut cat = CompanyCategory {
        id: id.to_string(),
        name: name.to_string(),
        progress: 0,
        steps: steps
            .iter()
            .map(|(id, label, done)| CompanyStep {
                id: id.to_string(),
                label: label.to_string(),
                is_completed: *done,
            })
            .collect(),
    };
    cat.recompute_progress();
    cat
}

fn entity(
    id: &str,
    name: &str,
    parent_id: Option<&str>,
    ownership: Option<u8>,
    status: EntityStatus,
    logo: Option<&str>,
    categories: Vec<CompanyCategory>,
) -> DetailedCompany {
    DetailedCompany {
        id: id.to_string(),
        name: name.to_string(),
        logo: logo.map(str::to_string),
        parent_id: parent_id.map(str::to_string),
        ownership,
        status,
        categories,
    }
}

/// Demo company group
pub fn demo_companies() -> Vec<DetailedCompany> {
    vec![
        entity(
            "c1",
            "RFX Corp",
            None,
            None,
            EntityStatus::Attivo,
            Some("https://ui-avatars.com/api/?name=RFX+Corp&background=0D8ABC&color=fff&size=128"),
            vec![category(
                "cat1",
                "Costituzione",
                &[
                    ("s1", "Definizione strategia holding", true),
                    ("s2", "Scelta forma giuridica", true),
                    ("s3", "Rogito notarile", true),
                ],
            )],
        ),
        entity("c2", "Digital2Web S.r.l.", Some("c1"), Some(100), EntityStatus::Pianificazione, None, vec![]),
        entity("c3", "Local Consulting", Some("c2"), Some(80), EntityStatus::Idea, None, vec![]),
        entity("c4", "RFX Real Estate", Some("c1"), Some(51), EntityStatus::Sviluppo, None, vec![]),
        entity("c5", "RFX Academy", Some("c1"), Some(100), EntityStatus::Idea, None, vec![]),
    ]
}

/// Demo ERP landscape
pub fn demo_erp_systems() -> Vec<DetailedCompany> {
    vec![
        entity(
            "erp_core",
            "RFX Omni-ERP Core",
            None,
            None,
            EntityStatus::Sviluppo,
            Some("https://ui-avatars.com/api/?name=ERP+Core&background=1e293b&color=3b82f6&size=128"),
            vec![category(
                "ecat1",
                "Architettura & Backend",
                &[
                    ("es1", "Setup Ambiente Cloud (AWS)", true),
                    ("es2", "Progettazione Database", true),
                    ("es3", "Sistema di Autenticazione", true),
                    ("es4", "Implementazione API Gateway", false),
                ],
            )],
        ),
        entity(
            "erp_dashboard",
            "HQ Web Dashboard",
            Some("erp_core"),
            None,
            EntityStatus::Attivo,
            Some("https://ui-avatars.com/api/?name=HQ+Web&background=3b82f6&color=fff&size=128"),
            vec![category(
                "ecat_dash_1",
                "Modulo Vendite & CRM",
                &[
                    ("d1", "Gestione Anagrafica Clienti", true),
                    ("d2", "Pipeline Opportunità", true),
                    ("d3", "Motore Calcolo Preventivi", true),
                    ("d4", "Analisi Statistiche Avanzate", false),
                ],
            )],
        ),
        entity(
            "erp_partner",
            "Partner Portal",
            Some("erp_core"),
            None,
            EntityStatus::Pianificazione,
            Some("https://ui-avatars.com/api/?name=Partner+Portal&background=10b981&color=fff&size=128"),
            vec![category(
                "ecat_part_1",
                "Gestione Rete & Provvigioni",
                &[
                    ("p1", "Portale Self-Service Partner", false),
                    ("p2", "Visualizzazione Provvigioni", false),
                    ("p3", "Download Materiale Marketing", true),
                ],
            )],
        ),
        entity(
            "erp_agent_app",
            "Agent Sales App",
            Some("erp_core"),
            None,
            EntityStatus::Sviluppo,
            Some("https://ui-avatars.com/api/?name=Agent+App&background=f59e0b&color=fff&size=128"),
            vec![category(
                "ecat_app_1",
                "App Agenti (Mobile)",
                &[
                    ("a1", "UX/UI Design Mobile", true),
                    ("a2", "Catalogo Digitale Interattivo", true),
                    ("a3", "Sviluppo Modulo Presa Ordini Offline", false),
                    ("a4", "Geolocalizzazione", false),
                ],
            )],
        ),
    ]
}

/// Demo tracked products and partners
pub fn demo_tracked() -> Vec<TrackedEntity> {
    vec![TrackedEntity {
        id: "p1".to_string(),
        entity_type: EntityType::Product,
        name: "RFX Wallet".to_string(),
        status: EntityStatus::Sviluppo,
        description: "App di gestione finanziaria decentralizzata.".to_string(),
        progress: 45,
        start_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap_or_default(),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::completion_percentage;

    #[test]
    fn test_factory_templates_shape() {
        let company = company_template();
        let erp = erp_template();
        assert_eq!(company.len(), 4);
        assert_eq!(company[0].steps.len(), 9);
        assert_eq!(erp.len(), 4);
        assert!(erp.iter().all(|c| c.steps.len() == 5));
    }

    #[test]
    fn test_demo_progress_is_consistent() {
        for entity in demo_companies().iter().chain(demo_erp_systems().iter()) {
            for cat in &entity.categories {
                assert_eq!(
                    cat.progress,
                    completion_percentage(cat.completed_steps(), cat.steps.len()),
                    "{} / {}",
                    entity.name,
                    cat.name
                );
            }
        }
    }

    #[test]
    fn test_demo_parents_exist() {
        let companies = demo_companies();
        for c in &companies {
            if let Some(parent) = &c.parent_id {
                assert!(companies.iter().any(|p| &p.id == parent));
            }
        }
    }
}
